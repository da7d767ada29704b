//! Error types for the scan pipeline

use thiserror::Error;

/// Errors raised while talking to the Azure CLI or producing a report
#[derive(Debug, Error)]
pub enum ScanError {
    /// The `az` executable could not be located
    #[error("Azure CLI (az) not found in PATH. Install via: brew install azure-cli")]
    ToolNotFound,

    /// The process could not be started at all
    #[error("Failed to start command:\n  {command}\n\n{source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a non-zero status
    #[error("Command failed:\n  {command}\n\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    /// The process did not finish within the per-call timeout
    #[error("Command timed out after {secs}s:\n  {command}")]
    Timeout { command: String, secs: u64 },

    /// The process printed something that is not the expected JSON
    #[error("Unexpected output from:\n  {command}\n\n{source}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// The tenant has no subscription in the `Enabled` state
    #[error("No enabled subscriptions found in this tenant.")]
    NoSubscriptions,

    /// A structured report could not be serialised
    #[error("Failed to export report: {0}")]
    Export(String),
}

impl ScanError {
    /// Last non-empty line of the rendered message, used for inline notes
    pub fn summary_line(&self) -> String {
        let rendered = self.to_string();
        rendered
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

impl From<csv::Error> for ScanError {
    fn from(err: csv::Error) -> Self {
        ScanError::Export(err.to_string())
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, ScanError>;
