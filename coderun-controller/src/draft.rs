//! Editable run inputs
//!
//! A [`Draft`] holds what the editor and the dependency picker currently show.
//! Both widgets push their values through the change callbacks; the controller
//! only reads the draft when a run is started.

use coderun_core::domain::execution::ExecutionRequest;

/// Code shown in a fresh editor
pub const DEFAULT_CODE: &str = "# print(\"Hello, World!\")";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    code: String,
    dependencies: Vec<String>,
}

impl Draft {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            dependencies: Vec::new(),
        }
    }

    /// Editor change callback
    pub fn on_change(&mut self, text: impl Into<String>) {
        self.code = text.into();
    }

    /// Dependency picker change callback
    pub fn on_selection_change(&mut self, selection: Vec<String>) {
        self.dependencies = selection;
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Snapshot of the current inputs, frozen for submission
    pub fn to_request(&self) -> ExecutionRequest {
        ExecutionRequest::new(self.code.clone(), self.dependencies.clone())
    }
}

impl Default for Draft {
    fn default() -> Self {
        Self::new(DEFAULT_CODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_draft() {
        let draft = Draft::default();
        assert_eq!(draft.code(), DEFAULT_CODE);
        assert!(draft.dependencies().is_empty());
    }

    #[test]
    fn test_request_is_a_snapshot() {
        let mut draft = Draft::default();
        draft.on_change("import requests");
        draft.on_selection_change(vec!["requests".to_string()]);

        let request = draft.to_request();

        draft.on_change("print(2)");
        draft.on_selection_change(vec![]);

        assert_eq!(request.code, "import requests");
        assert_eq!(request.dependencies, vec!["requests".to_string()]);
    }
}
