//! Diagnostic domain types
//!
//! Static-analysis findings returned by the execution service when it refuses
//! to run a request.

use serde::{Deserialize, Serialize};

/// A single static-analysis finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticIssue {
    pub filename: String,
    pub line_number: i64,
    pub issue_text: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub test_name: String,
}

/// Finding severity, as reported by the analysis engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Confidence the analysis engine has in a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
    Unknown,
}

impl DiagnosticIssue {
    /// Builds the synthetic issue reported when the service could not be
    /// reached or answered with something unreadable.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            filename: "<client>".to_string(),
            line_number: 0,
            issue_text: message.into(),
            severity: Severity::Critical,
            confidence: Confidence::Unknown,
            test_name: "transport".to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        self.test_name == "transport" && self.filename == "<client>"
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} [{}/{}] {}: {}",
            self.filename,
            self.line_number,
            self.severity,
            self.confidence,
            self.test_name,
            self.issue_text
        )
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
            Confidence::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}
