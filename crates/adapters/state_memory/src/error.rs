//! State store error types.

use std::path::PathBuf;

/// Failure reading or writing a state snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to access snapshot at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot at {path} is not valid JSON")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot holds an invalid state id")]
    InvalidId(#[source] timeswitch_domain::error::ValidationError),
}
