//! Coderun Controller
//!
//! Client-side lifecycle of a remote code execution.
//!
//! Architecture:
//! - Configuration: service address, poll cadence and completion contract
//! - Draft: the editor and dependency-picker inputs read at submit time
//! - Submission: one `POST /execute`, every answer folded into a [`SubmitOutcome`]
//! - State: the [`RunState`] machine with stale-update suppression
//! - Controller: spawns a run, polls until it settles, publishes state on a watch channel
//!
//! # Example
//!
//! ```no_run
//! use coderun_controller::{ControllerConfig, Draft, Phase, RunController};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let controller = RunController::from_config(ControllerConfig::from_env()?)?;
//!
//!     let mut draft = Draft::default();
//!     draft.on_change("print(1)");
//!     controller.run_draft(&draft);
//!
//!     if let Phase::Completed { output, .. } = controller.wait_settled().await.phase() {
//!         print!("{}", output.stdout);
//!     }
//!     Ok(())
//! }
//! ```

mod backend;
mod config;
mod controller;
mod draft;
mod state;
mod submission;

#[cfg(test)]
mod testing;

pub use backend::ExecutionBackend;
pub use config::{CompletionPolicy, ControllerConfig, MAX_POLL_INTERVAL, MIN_POLL_INTERVAL};
pub use controller::{ControllerStats, RunController};
pub use draft::{DEFAULT_CODE, Draft};
pub use state::{LiveOutput, Phase, RunState, Tick, TransitionError};
pub use submission::{SubmitOutcome, submit};
