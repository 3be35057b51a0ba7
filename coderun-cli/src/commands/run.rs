//! Run command handler
//!
//! Reads source code, submits it through the run controller and follows the
//! run until it settles, then prints its output or diagnostics.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use coderun_client::ExecutionClient;
use coderun_controller::{CompletionPolicy, Draft, Phase, RunController, RunState};
use coderun_core::domain::diagnostic::{DiagnosticIssue, Severity};
use tokio::sync::watch;

use crate::config::Config;

/// Arguments for the run command
#[derive(Args)]
pub struct RunArgs {
    /// Source file to execute, or `-` to read from stdin
    file: PathBuf,

    /// Package to install before running (repeatable)
    #[arg(short = 'r', long = "requirement")]
    requirements: Vec<String>,

    /// Delay between status polls, in milliseconds (500-5000)
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// How to recognise the final poll response: union, status or output
    #[arg(long)]
    completion: Option<String>,
}

/// Handle the run command
pub async fn handle_run(args: RunArgs, config: &Config) -> Result<()> {
    let code = read_code(&args.file)?;

    let mut draft = Draft::new(code);
    draft.on_selection_change(args.requirements);

    let mut controller_config = config.controller.clone();
    if let Some(ms) = args.poll_interval_ms {
        controller_config = controller_config.with_poll_interval(Duration::from_millis(ms));
    }
    if let Some(completion) = args.completion {
        let completion = completion.parse::<CompletionPolicy>()?;
        controller_config = controller_config.with_completion(completion);
    }

    let controller = RunController::from_config(controller_config)?;
    let rx = controller.subscribe();
    controller.run_draft(&draft);

    let state = follow_run(&controller, rx, tokio::signal::ctrl_c()).await?;
    print_outcome(&state)
}

/// Prints progress until the run settles; `interrupt` cancels it and fails
async fn follow_run(
    controller: &RunController<ExecutionClient>,
    mut rx: watch::Receiver<RunState>,
    interrupt: impl Future<Output = std::io::Result<()>>,
) -> Result<RunState> {
    tokio::pin!(interrupt);

    let mut last_line = String::new();
    loop {
        tokio::select! {
            biased;
            _ = &mut interrupt => {
                controller.cancel();
                eprintln!("{}", "Run cancelled.".yellow());
                anyhow::bail!("run was cancelled");
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    return Ok(controller.state());
                }
                let state = rx.borrow_and_update().clone();

                if let Some(line) = progress_line(&state) {
                    if line != last_line {
                        eprintln!("{}", line.dimmed());
                        last_line = line;
                    }
                }

                if state.phase().is_settled() {
                    return Ok(state);
                }
            }
        }
    }
}

/// Reads the program text from a file, or from stdin for `-`
fn read_code(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut code = String::new();
        std::io::stdin()
            .read_to_string(&mut code)
            .context("Failed to read code from stdin")?;
        return Ok(code);
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// One status line per in-flight phase
fn progress_line(state: &RunState) -> Option<String> {
    match state.phase() {
        Phase::Submitting => Some("▸ Submitting...".to_string()),
        Phase::Polling { handle, output } => Some(match &output.status {
            Some(status) => format!("▸ Task {} ({})", handle, status),
            None => format!("▸ Task {} queued", handle),
        }),
        _ => None,
    }
}

/// Print the settled state; rejected and failed runs become errors
fn print_outcome(state: &RunState) -> Result<()> {
    match state.phase() {
        Phase::Completed { output, .. } => {
            if !output.stdout.is_empty() {
                print!("{}", output.stdout);
            }
            if !output.stderr.is_empty() {
                eprint!("{}", output.stderr.red());
            }
            if output.stdout.is_empty() && output.stderr.is_empty() {
                match &output.status {
                    Some(status) => {
                        eprintln!("{}", format!("(no output, status {})", status).dimmed())
                    }
                    None => eprintln!("{}", "(no output)".dimmed()),
                }
            }
            Ok(())
        }
        Phase::Rejected { issues } => {
            eprintln!(
                "{}",
                format!("✗ Rejected with {} issue(s)", issues.len()).red().bold()
            );
            for issue in issues {
                print_issue(issue);
            }
            anyhow::bail!("run was rejected")
        }
        Phase::Failed { handle, error } => {
            eprintln!("{}", format!("✗ Lost track of task {}", handle).red().bold());
            eprintln!("  {}", error.red());
            anyhow::bail!("polling failed")
        }
        Phase::Idle => anyhow::bail!("run was cancelled"),
        Phase::Submitting | Phase::Polling { .. } => {
            anyhow::bail!("run stopped while still {}", state.phase().name())
        }
    }
}

/// Print a diagnostic issue
fn print_issue(issue: &DiagnosticIssue) {
    println!(
        "  {} {}:{} {} {}",
        colorize_severity(issue.severity),
        issue.filename.cyan(),
        issue.line_number,
        format!("[{}]", issue.test_name).dimmed(),
        issue.issue_text
    );
    println!("    Confidence: {}", issue.confidence.to_string().dimmed());
}

/// Colorize issue severity for display
fn colorize_severity(severity: Severity) -> colored::ColoredString {
    let severity_str = severity.to_string();
    match severity {
        Severity::Low => severity_str.dimmed(),
        Severity::Medium => severity_str.yellow(),
        Severity::High => severity_str.red(),
        Severity::Critical => severity_str.red().bold(),
    }
}
