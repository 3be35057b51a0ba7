//! Status command handler
//!
//! Fetches one `GET /task_result/{task_id}` snapshot without starting a poll loop.

use anyhow::{Context, Result};
use colored::*;
use coderun_client::ExecutionClient;
use coderun_core::domain::execution::{PollResult, TaskHandle};

use crate::config::Config;

/// Fetch and display the current result of a task
pub async fn handle_status(task_id: &str, config: &Config) -> Result<()> {
    let client = ExecutionClient::with_timeout(
        config.controller.api_url.clone(),
        config.controller.request_timeout,
    )?;

    let handle = TaskHandle::new(task_id);
    let result = client
        .task_result(&handle)
        .await
        .with_context(|| format!("Failed to fetch result of task {}", handle))?;

    print!("{}", render_result(&handle, &result));
    Ok(())
}

/// Formats a task snapshot; missing fields are left out
fn render_result(handle: &TaskHandle, result: &PollResult) -> String {
    let mut out = format!("{}\n", format!("Task {}:", handle).bold());
    out.push_str(&format!(
        "  Status: {}\n",
        result.status_text().unwrap_or("(not reported)").cyan()
    ));

    if let Some(stdout) = result.stdout_text() {
        out.push_str(&format!("\n{}\n{}", "Stdout:".bold(), stdout));
    }

    if let Some(stderr) = result.stderr_text() {
        out.push_str(&format!("\n{}\n{}", "Stderr:".bold(), stderr.red()));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderun_controller::ControllerConfig;

    #[test]
    fn test_render_pending_task() {
        let result = PollResult {
            status: Some("PENDING".to_string()),
            ..Default::default()
        };
        let out = render_result(&TaskHandle::new("abc"), &result);

        assert!(out.contains("abc"));
        assert!(out.contains("PENDING"));
        assert!(!out.contains("Stdout:"));
        assert!(!out.contains("Stderr:"));
    }

    #[test]
    fn test_render_finished_task() {
        let result = PollResult {
            stdout: Some("1\n".to_string()),
            stderr: Some("warning\n".to_string()),
            status: None,
        };
        let out = render_result(&TaskHandle::new("abc"), &result);

        assert!(out.contains("(not reported)"));
        assert!(out.contains("Stdout:"));
        assert!(out.contains("1\n"));
        assert!(out.contains("warning"));
    }

    #[tokio::test]
    async fn test_unreachable_service_names_the_task() {
        let config = Config {
            controller: ControllerConfig::new("http://127.0.0.1:1".to_string()),
        };

        let err = handle_status("abc", &config).await.unwrap_err();
        assert!(err.to_string().contains("Failed to fetch result of task abc"));
    }
}
