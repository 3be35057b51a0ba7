//! Configuration module
//!
//! Combines the `CODERUN_*` environment settings with command-line overrides.

use anyhow::{Context, Result};
use coderun_controller::ControllerConfig;
use tracing::debug;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings handed to the run controller
    pub controller: ControllerConfig,
}

impl Config {
    /// Loads settings from the environment, with `api_url` taken from the command line
    pub fn load(api_url: String) -> Result<Self> {
        let mut controller =
            ControllerConfig::from_env().context("Invalid CODERUN_* environment settings")?;
        controller.api_url = api_url;
        debug!("Using execution service at {}", controller.api_url);

        Ok(Self { controller })
    }
}
