use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that terminate the current plugin invocation.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("failed to read analytics configuration at {}: {reason}", .path.display())]
    ConfigRead { path: PathBuf, reason: String },

    #[error("failed to write analytics configuration at {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "no data directory available, set BITRISE_PLUGIN_INPUT_DATA_DIR or HOME to locate the analytics configuration"
    )]
    MissingDataDir,

    #[error("failed to parse plugin input ({payload}): {reason}")]
    PayloadParse { payload: String, reason: String },

    #[error("failed to send analytics: {0}")]
    Submission(#[from] SubmissionError),
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint responded with {0}")]
    Status(StatusCode),

    #[error("could not serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
