//! Error types for variable sync.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for variable sync operations.
pub type VariableResult<T> = Result<T, VariableError>;

/// Errors that can occur while pushing or reading variables.
#[derive(Debug, Error)]
pub enum VariableError {
    #[error("failed to encode variables: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pattern for variable {name}: {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("push worker is not running")]
    WorkerGone,

    #[error("sink rejected the push: {0}")]
    Rejected(String),
}
