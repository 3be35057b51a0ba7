//! Execution domain types

use serde::{Deserialize, Serialize};

/// Source code and package dependencies submitted for remote execution
///
/// Immutable once sent. `code` may be empty and `dependencies` are free-form
/// package names that are not validated client-side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionRequest {
    pub code: String,
    pub dependencies: Vec<String>,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>, dependencies: Vec<String>) -> Self {
        Self {
            code: code.into(),
            dependencies,
        }
    }
}

/// Opaque identifier issued by the execution service on acceptance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskHandle {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Body of a single `GET /task_result/{task_id}` response
///
/// Depending on the backend, `stdout`/`stderr` are either cumulative snapshots
/// or only present once the task is done, and `status` may be missing on any
/// given tick. No field is assumed to exclude another.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PollResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl PollResult {
    /// Returns the stdout fragment if it carries any text
    pub fn stdout_text(&self) -> Option<&str> {
        self.stdout.as_deref().filter(|s| !s.is_empty())
    }

    /// Returns the stderr fragment if it carries any text
    pub fn stderr_text(&self) -> Option<&str> {
        self.stderr.as_deref().filter(|s| !s.is_empty())
    }

    /// Returns the reported status if it is present and non-blank
    pub fn status_text(&self) -> Option<&str> {
        self.status.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// True when either output field was sent, even if empty
    pub fn has_output_fields(&self) -> bool {
        self.stdout.is_some() || self.stderr.is_some()
    }
}
