//! Execution backend seam
//!
//! The controller talks to the execution service only through this trait so it
//! can be driven by the HTTP client in production and by scripted backends in tests.

use async_trait::async_trait;
use coderun_client::{ClientError, ExecutionClient};
use coderun_core::domain::execution::{ExecutionRequest, PollResult, TaskHandle};

/// Remote execution service as seen by the controller
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Submits a request and returns the handle of the accepted task
    async fn execute(&self, request: &ExecutionRequest) -> Result<TaskHandle, ClientError>;

    /// Fetches the current status and output of a task
    async fn task_result(&self, handle: &TaskHandle) -> Result<PollResult, ClientError>;
}

#[async_trait]
impl ExecutionBackend for ExecutionClient {
    async fn execute(&self, request: &ExecutionRequest) -> Result<TaskHandle, ClientError> {
        ExecutionClient::execute(self, request).await
    }

    async fn task_result(&self, handle: &TaskHandle) -> Result<PollResult, ClientError> {
        ExecutionClient::task_result(self, handle).await
    }
}
