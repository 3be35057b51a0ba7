//! Submission component
//!
//! Sends one execution request and folds every possible answer into a
//! [`SubmitOutcome`]. Errors never escape: transport and parse failures become
//! a single synthetic diagnostic so the caller always has something to show.

use coderun_client::ClientError;
use coderun_core::domain::diagnostic::DiagnosticIssue;
use coderun_core::domain::execution::{ExecutionRequest, TaskHandle};
use tracing::{info, warn};

use crate::backend::ExecutionBackend;

/// Result of submitting an execution request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The service queued the task under this handle
    Accepted(TaskHandle),
    /// The service refused the request, or could not be reached
    Rejected(Vec<DiagnosticIssue>),
}

/// Submits `request` and classifies the answer
pub async fn submit<B>(backend: &B, request: &ExecutionRequest) -> SubmitOutcome
where
    B: ExecutionBackend + ?Sized,
{
    match backend.execute(request).await {
        Ok(handle) => {
            info!("Submission accepted as task {}", handle);
            SubmitOutcome::Accepted(handle)
        }
        Err(ClientError::Rejected { status, issues }) => {
            info!(
                "Submission rejected (status {}) with {} issue(s)",
                status,
                issues.len()
            );
            SubmitOutcome::Rejected(issues)
        }
        Err(e) => {
            warn!("Submission failed: {}", e);
            SubmitOutcome::Rejected(vec![DiagnosticIssue::transport(e.to_string())])
        }
    }
}
