//! DTOs for `POST /execute`

use serde::{Deserialize, Serialize};

use crate::domain::diagnostic::DiagnosticIssue;
use crate::domain::execution::ExecutionRequest;

/// Request body sent to `POST /execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteBody {
    pub code: String,
    pub requirements: Vec<String>,
}

impl From<&ExecutionRequest> for ExecuteBody {
    fn from(req: &ExecutionRequest) -> Self {
        Self {
            code: req.code.clone(),
            requirements: req.dependencies.clone(),
        }
    }
}

/// Success body of `POST /execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAccepted {
    #[serde(default, alias = "taskId")]
    pub task_id: Option<String>,
}

impl TaskAccepted {
    /// The issued task id, if the body carried a usable one
    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Error body of `POST /execute` when the request is refused
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionBody {
    pub detail: RejectionDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionDetail {
    pub issues: Vec<DiagnosticIssue>,
}
