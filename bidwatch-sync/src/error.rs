//! Error types for bidwatch-sync.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while applying or confirming an update.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Confirmation found no data line for a key that was just written.
    #[error("confirm: key {key} not found in {path}")]
    KeyMissing { path: PathBuf, key: String },

    /// Confirmation found the key but with a different value.
    #[error("confirm: key {key} in {path} has value {found:?}, expected {expected:?}")]
    ValueMismatch {
        path: PathBuf,
        key: String,
        expected: String,
        found: String,
    },
}

impl SyncError {
    /// `true` for the post-write verification failures.
    pub fn is_confirm_mismatch(&self) -> bool {
        matches!(
            self,
            SyncError::KeyMissing { .. } | SyncError::ValueMismatch { .. }
        )
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
