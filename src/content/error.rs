use std::path::PathBuf;

use thiserror::Error;

/// A filesystem check failed for a reason other than the entry being absent.
///
/// Kept separate from [`ContentStatus::Absent`](super::ContentStatus) so a
/// permissions problem is never reported as content that was never fetched.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Failed to inspect {path}: {source}")]
    Probe {
        path: PathBuf,
        source: std::io::Error,
    },
}
