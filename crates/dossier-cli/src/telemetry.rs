//! Logging configuration from environment variables.
//!
//! Logs always go to stderr so that `--json` output on stdout stays
//! machine-readable.

use anyhow::{Context, Result};
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging knobs for the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Filter directive (trace, debug, info, warn, error, or a full EnvFilter)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DOSSIER_LOG` or `RUST_LOG`: log filter (default: warn)
    /// - `DOSSIER_JSON_LOGS`: enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("DOSSIER_LOG")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "warn".to_string()),

            json_logs: env::var("DOSSIER_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Raise the level for each `-v`: one for info, two for debug, three or
    /// more for trace. Explicit filters from the environment are kept.
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        let level = match verbose {
            0 => return self,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        if self.log_level == "warn" || self.log_level == "error" {
            self.log_level = level.to_string();
        }
        self
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &TelemetryConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("Invalid log filter: {}", config.log_level))?;

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .context("Failed to install log subscriber")?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("Failed to install log subscriber")?;
    }

    Ok(())
}
