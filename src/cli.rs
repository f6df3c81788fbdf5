//! CLI command implementations for Frontline.

pub(crate) mod replay;
pub(crate) mod rules;
pub(crate) mod validate;

mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use frontline::RulesConfig;
use tracing_subscriber::EnvFilter;

/// Output format for the `replay` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReplayFormat {
    /// Human-readable summary.
    Text,
    /// Final snapshot as JSON.
    Json,
    /// Summary followed by an ASCII board.
    Board,
}

/// Initialise logging to stderr.
///
/// An explicit filter wins over `RUST_LOG`; the fallback is `warn`.
pub(crate) fn init_tracing(filter: Option<&str>) {
    let filter = filter
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read and validate a rules file, or fall back to the built-in rules.
pub(crate) fn load_rules(path: Option<&Path>) -> Result<RulesConfig, CliError> {
    let Some(path) = path else {
        return Ok(RulesConfig::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;
    Ok(RulesConfig::from_json(&text)?)
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<frontline::ConfigError> for CliError {
    fn from(e: frontline::ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<frontline::SnapshotError> for CliError {
    fn from(e: frontline::SnapshotError) -> Self {
        Self::new(e.to_string())
    }
}
