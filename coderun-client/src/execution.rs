//! Execution-related API endpoints

use crate::ExecutionClient;
use crate::error::{ClientError, Result};
use coderun_core::domain::execution::{ExecutionRequest, PollResult, TaskHandle};
use coderun_core::dto::execute::{ExecuteBody, TaskAccepted};
use reqwest::Url;
use tracing::debug;

impl ExecutionClient {
    // =============================================================================
    // Task Lifecycle
    // =============================================================================

    /// Submit code for execution
    ///
    /// Sends `{ code, requirements }` as JSON to `POST /execute`.
    ///
    /// # Returns
    /// The handle of the accepted task. A refusal carrying diagnostics comes back
    /// as `ClientError::Rejected`; a success body without a task id is a
    /// `ClientError::ParseError`.
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<TaskHandle> {
        let url = format!("{}/execute", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ExecuteBody::from(request))
            .send()
            .await?;

        let accepted: TaskAccepted = self.handle_rejectable_response(response).await?;
        let handle = accepted
            .task_id()
            .map(TaskHandle::new)
            .ok_or_else(|| ClientError::ParseError("Response is missing task_id".to_string()))?;

        debug!("Execution accepted as task {}", handle);
        Ok(handle)
    }

    /// Fetch the current status and output of a task
    ///
    /// # Arguments
    /// * `handle` - The handle returned by [`execute`](Self::execute)
    pub async fn task_result(&self, handle: &TaskHandle) -> Result<PollResult> {
        let url = self.task_result_url(handle)?;
        let response = self.client.get(url).send().await?;

        self.handle_response(response).await
    }

    /// `{base}/task_result/{id}` with the id encoded as a single path segment
    fn task_result_url(&self, handle: &TaskHandle) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push("task_result")
            .push(handle.as_str());
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderun_core::domain::diagnostic::Severity;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_execute_returns_task_handle() -> anyhow::Result<()> {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/execute")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "code": "print(1)",
                "requirements": ["requests"]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"task_id":"abc"}"#)
            .create_async()
            .await;

        let client = ExecutionClient::new(server.url());
        let handle = client
            .execute(&ExecutionRequest::new("print(1)", vec!["requests".to_string()]))
            .await?;

        assert_eq!(handle.as_str(), "abc");
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_execute_parses_rejection_issues() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"detail":{"issues":[{
                    "filename":"main.py","line_number":1,
                    "issue_text":"Use of exec detected.","severity":"CRITICAL",
                    "confidence":"HIGH","test_name":"exec_used"}]}}"#,
            )
            .create_async()
            .await;

        let client = ExecutionClient::new(server.url());
        let err = client
            .execute(&ExecutionRequest::new("exec('1')", vec![]))
            .await
            .unwrap_err();

        match err {
            ClientError::Rejected { status, issues } => {
                assert_eq!(status, 400);
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].severity, Severity::Critical);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_unstructured_error_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let client = ExecutionClient::new(server.url());
        let err = client
            .execute(&ExecutionRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::ApiError { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_execute_without_task_id_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"queued"}"#)
            .create_async()
            .await;

        let client = ExecutionClient::new(server.url());
        let err = client
            .execute(&ExecutionRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_task_result_reads_partial_body() -> anyhow::Result<()> {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/task_result/abc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"PENDING"}"#)
            .create_async()
            .await;

        let client = ExecutionClient::new(server.url());
        let result = client.task_result(&TaskHandle::new("abc")).await?;

        assert_eq!(result.status.as_deref(), Some("PENDING"));
        assert!(result.stdout.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_task_result_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/task_result/gone")
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;

        let client = ExecutionClient::new(server.url());
        let err = client
            .task_result(&TaskHandle::new("gone"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_task_result_url_encodes_handle() {
        let client = ExecutionClient::new("http://localhost:8000/api/");
        let url = client.task_result_url(&TaskHandle::new("job#42?x=1")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/task_result/job%2342%3Fx=1"
        );

        let url = client.task_result_url(&TaskHandle::new("a/b")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/task_result/a%2Fb");
    }

    #[test]
    fn test_task_result_url_rejects_bad_base() {
        let client = ExecutionClient::new("not a url");
        let err = client.task_result_url(&TaskHandle::new("abc")).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_task_result_keeps_reserved_characters_in_handle() -> anyhow::Result<()> {
        let mut server = mockito::Server::new_async().await;
        let other = server
            .mock("GET", "/task_result/job")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"stdout":"other task"}"#)
            .expect(0)
            .create_async()
            .await;
        let own = server
            .mock("GET", "/task_result/job%2342%3Fx=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"SUCCESS","stdout":"mine"}"#)
            .create_async()
            .await;

        let client = ExecutionClient::new(server.url());
        let result = client.task_result(&TaskHandle::new("job#42?x=1")).await?;

        assert_eq!(result.stdout.as_deref(), Some("mine"));
        own.assert_async().await;
        other.assert_async().await;
        Ok(())
    }
}
