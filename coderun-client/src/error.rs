//! Error types for the coderun client

use coderun_core::domain::diagnostic::DiagnosticIssue;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the execution service
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (DNS, connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The service refused the request and explained why
    #[error("Request rejected (status {status}) with {} issue(s)", .issues.len())]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Structured diagnostics from the rejection payload
        issues: Vec<DiagnosticIssue>,
    },

    /// API returned an error status code without a structured payload
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Raw response body
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The base URL cannot carry a task path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if the service answered with a structured rejection
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::ApiError { status, .. } | Self::Rejected { status, .. } => {
                (400..500).contains(status)
            }
            _ => false,
        }
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::ApiError { status, .. } | Self::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
