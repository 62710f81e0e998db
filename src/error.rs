//! Typed failures surfaced by the decision core.
//!
//! Only [`DecisionError`] ever reaches a caller of the decision agent. The
//! persistence and reasoning errors are recovered locally by their owners and
//! exist so those recoveries can be logged and tested precisely.

use std::path::PathBuf;
use std::time::Duration;

/// Rejection of a single decision request. Never affects shared memory state.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// The request named an input kind outside `url | password | text`.
    #[error("unknown input kind: {0}")]
    InvalidKind(String),
    /// The request body could not be interpreted at all (e.g. not a JSON object).
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

/// Failure to read or write the persisted memory snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("i/o error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("corrupt snapshot at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("unsupported snapshot schema version {found} (expected {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },
    #[error("snapshot write timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure of the optional reasoning capability. Always replaced by a template.
#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("reasoning timed out after {0:?}")]
    Timeout(Duration),
    #[error("reasoning provider failed: {0}")]
    Provider(String),
    #[error("reasoning provider returned an empty explanation")]
    Empty,
}
