//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod run;
mod status;

pub use run::RunArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a source file and follow it until it finishes
    Run(RunArgs),
    /// Fetch the current result of a task once
    Status {
        /// Task ID returned by the service
        task_id: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run(args) => run::handle_run(args, config).await,
        Commands::Status { task_id } => status::handle_status(&task_id, config).await,
    }
}
