//! Coderun CLI
//!
//! Command-line front end for the remote code-execution service.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coderun")]
#[command(about = "Run code on a remote execution service", long_about = None)]
struct Cli {
    /// Execution service URL
    #[arg(long, env = "CODERUN_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Log controller and HTTP activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "coderun=debug,coderun_controller=debug,coderun_client=debug"
    } else {
        "coderun=warn,coderun_controller=warn,coderun_client=warn"
    };

    // Logs go to stderr so they never mix with program output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.api_url)?;

    handle_command(cli.command, &config).await
}
