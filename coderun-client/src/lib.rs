//! Coderun HTTP Client
//!
//! A small, type-safe HTTP client for the remote code-execution service.
//!
//! The service exposes two endpoints: `POST /execute` accepts code plus a list of
//! package requirements and answers with a task id, and `GET /task_result/{task_id}`
//! reports the task's status and output so far.
//!
//! # Example
//!
//! ```no_run
//! use coderun_client::ExecutionClient;
//! use coderun_core::domain::execution::ExecutionRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), coderun_client::ClientError> {
//!     let client = ExecutionClient::new("http://localhost:8000");
//!
//!     let handle = client
//!         .execute(&ExecutionRequest::new("print(1)", vec![]))
//!         .await?;
//!     let result = client.task_result(&handle).await?;
//!
//!     println!("{:?}", result);
//!     Ok(())
//! }
//! ```

pub mod error;
mod execution;

// Re-export commonly used types
pub use error::{ClientError, Result};

use coderun_core::dto::execute::RejectionBody;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the execution service API
#[derive(Debug, Clone)]
pub struct ExecutionClient {
    /// Base URL of the service (e.g., "http://localhost:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl ExecutionClient {
    /// Create a new execution client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the execution service (e.g., "http://localhost:8000")
    ///
    /// # Example
    /// ```
    /// use coderun_client::ExecutionClient;
    ///
    /// let client = ExecutionClient::new("http://localhost:8000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new execution client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use coderun_client::ExecutionClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = ExecutionClient::with_client("http://localhost:8000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Create a client whose every request is bounded by `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Get the base URL of the execution service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Non-success statuses become `ClientError::ApiError`; success bodies that
    /// do not match `T` become `ClientError::ParseError`.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle a response that may carry a structured rejection payload
    ///
    /// Like [`handle_response`](Self::handle_response), except that an error body
    /// of the form `{ "detail": { "issues": [...] } }` becomes `ClientError::Rejected`.
    async fn handle_rejectable_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(match serde_json::from_str::<RejectionBody>(&error_text) {
                Ok(body) => ClientError::Rejected {
                    status: status.as_u16(),
                    issues: body.detail.issues,
                },
                Err(_) => ClientError::api_error(status.as_u16(), error_text),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ExecutionClient::new("http://localhost:8000");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = ExecutionClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_with_timeout() {
        let client =
            ExecutionClient::with_timeout("http://localhost:8000", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
