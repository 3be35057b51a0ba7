//! Controller configuration
//!
//! Defines the execution service address, the poll cadence, the per-request
//! timeout and how terminal poll responses are recognised.

use std::str::FromStr;
use std::time::Duration;

use coderun_core::domain::execution::PollResult;

/// Shortest poll interval accepted by [`ControllerConfig::validate`]
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Longest poll interval accepted by [`ControllerConfig::validate`]
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How a poll response is judged to be the last one for its task
///
/// Backends disagree on what they send: some report a `status` on every tick
/// and attach output only at the end, others stream cumulative output while
/// running, and the simplest ones drop `status` altogether once the result is
/// ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionPolicy {
    /// Terminal on a terminal status, on any non-empty output, or on a
    /// status-less response that carries output fields
    #[default]
    Union,
    /// Terminal only on a terminal status
    Status,
    /// Terminal as soon as an output field is present
    Output,
}

impl CompletionPolicy {
    /// Statuses that end a task, compared case-insensitively
    pub const TERMINAL_STATUSES: [&'static str; 4] = ["SUCCESS", "FAILED", "FAILURE", "REVOKED"];

    pub fn is_terminal_status(status: &str) -> bool {
        Self::TERMINAL_STATUSES
            .iter()
            .any(|terminal| terminal.eq_ignore_ascii_case(status))
    }

    /// Decides whether `result` ends the poll loop
    pub fn is_terminal(&self, result: &PollResult) -> bool {
        let terminal_status = result.status_text().is_some_and(Self::is_terminal_status);

        match self {
            CompletionPolicy::Union => {
                terminal_status
                    || result.stdout_text().is_some()
                    || result.stderr_text().is_some()
                    || (result.status_text().is_none() && result.has_output_fields())
            }
            CompletionPolicy::Status => terminal_status,
            CompletionPolicy::Output => result.has_output_fields(),
        }
    }
}

impl FromStr for CompletionPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "union" => Ok(CompletionPolicy::Union),
            "status" => Ok(CompletionPolicy::Status),
            "output" => Ok(CompletionPolicy::Output),
            other => anyhow::bail!(
                "unknown completion policy '{}' (expected union, status or output)",
                other
            ),
        }
    }
}

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Execution service base URL (e.g., "http://localhost:8000")
    pub api_url: String,

    /// Delay between the end of one poll round trip and the start of the next
    pub poll_interval: Duration,

    /// Upper bound on a single HTTP round trip. This does not cap how long a
    /// task may keep polling.
    pub request_timeout: Duration,

    /// Rule used to detect the final poll response
    pub completion: CompletionPolicy,
}

impl ControllerConfig {
    /// Creates a new configuration with defaults
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            poll_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
            completion: CompletionPolicy::Union,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - CODERUN_API_URL (optional, default: http://localhost:8000)
    /// - CODERUN_POLL_INTERVAL_MS (optional, milliseconds, default: 1000)
    /// - CODERUN_REQUEST_TIMEOUT (optional, seconds, default: 30)
    /// - CODERUN_COMPLETION (optional, union|status|output, default: union)
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(api_url) = std::env::var("CODERUN_API_URL") {
            config.api_url = api_url;
        }

        if let Some(poll_interval) = std::env::var("CODERUN_POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.poll_interval = Duration::from_millis(poll_interval);
        }

        if let Some(request_timeout) = std::env::var("CODERUN_REQUEST_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(request_timeout);
        }

        if let Ok(completion) = std::env::var("CODERUN_COMPLETION") {
            config.completion = completion.parse()?;
        }

        Ok(config)
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_completion(mut self, completion: CompletionPolicy) -> Self {
        self.completion = completion;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_url.is_empty() {
            anyhow::bail!("api_url cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.poll_interval < MIN_POLL_INTERVAL || self.poll_interval > MAX_POLL_INTERVAL {
            anyhow::bail!(
                "poll_interval must be between {:?} and {:?}, got {:?}",
                MIN_POLL_INTERVAL,
                MAX_POLL_INTERVAL,
                self.poll_interval
            );
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000".to_string())
    }
}
