//! Run state machine
//!
//! [`RunState`] is the single value the UI renders from. It only changes through
//! the transition methods below, each of which checks that the caller's run
//! generation (and, while polling, its task handle) is still the active one.
//! A continuation that lost the race gets [`TransitionError::Stale`] and the
//! state is left untouched.
//!
//! ```text
//! Idle ──begin──▶ Submitting ──rejected──▶ Rejected
//!                     │
//!                  accepted
//!                     ▼
//!                  Polling ◀─┐ tick (not terminal)
//!                     │──────┘
//!                     ├──terminal──▶ Completed
//!                     └──error─────▶ Failed
//!
//! any phase ──supersede──▶ Idle
//! ```

use coderun_core::domain::diagnostic::DiagnosticIssue;
use coderun_core::domain::execution::{PollResult, TaskHandle};
use thiserror::Error;

use crate::config::CompletionPolicy;
use crate::submission::SubmitOutcome;

/// Output accumulated from poll responses
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveOutput {
    pub stdout: String,
    pub stderr: String,
    /// Last non-blank status reported by the service
    pub status: Option<String>,
}

impl LiveOutput {
    /// Last-write-wins merge per field
    ///
    /// A non-empty incoming field replaces the stored one; an absent or empty
    /// field leaves it alone. This works for backends that send deltas as well as
    /// for backends that resend the whole text, without ever appending twice.
    pub fn merge(&mut self, result: &PollResult) {
        if let Some(stdout) = result.stdout_text() {
            self.stdout = stdout.to_string();
        }
        if let Some(stderr) = result.stderr_text() {
            self.stderr = stderr.to_string();
        }
        if let Some(status) = result.status_text() {
            self.status = Some(status.to_string());
        }
    }
}

/// Lifecycle phase of the current run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Rejected {
        issues: Vec<DiagnosticIssue>,
    },
    Polling {
        handle: TaskHandle,
        output: LiveOutput,
    },
    Completed {
        handle: TaskHandle,
        output: LiveOutput,
    },
    Failed {
        handle: TaskHandle,
        error: String,
    },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Submitting => "Submitting",
            Phase::Rejected { .. } => "Rejected",
            Phase::Polling { .. } => "Polling",
            Phase::Completed { .. } => "Completed",
            Phase::Failed { .. } => "Failed",
        }
    }

    /// True when nothing is in flight for this phase
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            Phase::Idle | Phase::Rejected { .. } | Phase::Completed { .. } | Phase::Failed { .. }
        )
    }

    /// True for `Completed` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed { .. } | Phase::Failed { .. })
    }

    /// A completed run that wrote to stderr
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Phase::Completed { output, .. } if !output.stderr.is_empty())
    }

    /// The task handle this phase refers to, if any
    pub fn handle(&self) -> Option<&TaskHandle> {
        match self {
            Phase::Polling { handle, .. }
            | Phase::Completed { handle, .. }
            | Phase::Failed { handle, .. } => Some(handle),
            _ => None,
        }
    }
}

/// Errors returned when a transition cannot be applied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The caller belongs to a run or task that is no longer active
    #[error("stale update for run {run} (active run is {active})")]
    Stale { run: u64, active: u64 },

    /// The trigger is not defined for the current phase
    #[error("cannot apply {trigger} while {phase}")]
    InvalidTransition {
        phase: &'static str,
        trigger: &'static str,
    },
}

/// What the poll loop should do after a tick was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Finished,
}

/// The controller-owned state of the current run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    run: u64,
    phase: Phase,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the current run; bumped whenever a run starts or is torn down
    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Idle -> Submitting. Returns the generation the new run must present on
    /// every later update.
    pub fn begin(&mut self) -> Result<u64, TransitionError> {
        if self.phase != Phase::Idle {
            return Err(self.invalid("begin"));
        }

        Ok(self.enter_submitting())
    }

    /// Any phase -> Idle. Every continuation of the previous run becomes stale.
    pub fn supersede(&mut self) {
        self.run += 1;
        self.phase = Phase::Idle;
    }

    /// Any phase -> Idle -> Submitting, for a run replacing whatever came before
    pub fn restart(&mut self) -> u64 {
        self.supersede();
        self.enter_submitting()
    }

    /// Submitting -> Rejected | Polling
    pub fn apply_submission(
        &mut self,
        run: u64,
        outcome: SubmitOutcome,
    ) -> Result<(), TransitionError> {
        self.check_run(run)?;
        if self.phase != Phase::Submitting {
            return Err(self.invalid("submission"));
        }

        self.phase = match outcome {
            SubmitOutcome::Rejected(issues) => Phase::Rejected { issues },
            SubmitOutcome::Accepted(handle) => Phase::Polling {
                handle,
                output: LiveOutput::default(),
            },
        };
        Ok(())
    }

    /// Polling -> Polling | Completed
    pub fn apply_poll(
        &mut self,
        run: u64,
        handle: &TaskHandle,
        result: &PollResult,
        policy: CompletionPolicy,
    ) -> Result<Tick, TransitionError> {
        self.check_polling(run, handle, "poll result")?;

        let terminal = policy.is_terminal(result);
        if let Phase::Polling { output, .. } = &mut self.phase {
            output.merge(result);

            if terminal {
                let output = std::mem::take(output);
                self.phase = Phase::Completed {
                    handle: handle.clone(),
                    output,
                };
                return Ok(Tick::Finished);
            }
        }

        Ok(Tick::Continue)
    }

    /// Polling -> Failed
    pub fn apply_poll_error(
        &mut self,
        run: u64,
        handle: &TaskHandle,
        error: String,
    ) -> Result<(), TransitionError> {
        self.check_polling(run, handle, "poll error")?;

        self.phase = Phase::Failed {
            handle: handle.clone(),
            error,
        };
        Ok(())
    }

    fn enter_submitting(&mut self) -> u64 {
        self.run += 1;
        self.phase = Phase::Submitting;
        self.run
    }

    fn check_run(&self, run: u64) -> Result<(), TransitionError> {
        if run != self.run {
            return Err(self.stale(run));
        }
        Ok(())
    }

    /// The caller must own the current run and the handle being polled
    fn check_polling(
        &self,
        run: u64,
        handle: &TaskHandle,
        trigger: &'static str,
    ) -> Result<(), TransitionError> {
        self.check_run(run)?;
        match &self.phase {
            Phase::Polling { handle: active, .. } if active == handle => Ok(()),
            Phase::Polling { .. } => Err(self.stale(run)),
            _ => Err(self.invalid(trigger)),
        }
    }

    fn stale(&self, run: u64) -> TransitionError {
        TransitionError::Stale {
            run,
            active: self.run,
        }
    }

    fn invalid(&self, trigger: &'static str) -> TransitionError {
        TransitionError::InvalidTransition {
            phase: self.phase.name(),
            trigger,
        }
    }
}
