//! Error types for the sync state module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing the sync state file.
#[derive(Error, Debug)]
pub enum StateError {
    /// The state file exists but could not be read.
    #[error("Failed to read sync state at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The state file was read but is not valid sync state.
    #[error("Sync state at {path} is corrupt: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Writing the state file (or its parent directory) failed.
    #[error("Failed to write sync state to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The in-memory state could not be serialized.
    #[error("Failed to serialize sync state: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Another writer holds the state lock.
    #[error("Another annextube-rs instance is updating this repository (lock: {path})")]
    Lock { path: PathBuf },
}

impl StateError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
