//! Error taxonomy
//!
//! Failures are classified by how callers recover from them, never by
//! message text:
//!
//! - [`SyncError::Unauthorized`] - credential invalid or expired; aborts the
//!   entire run, no retry (the credential must be renewed out of band).
//! - [`SyncError::Transient`] - network / 5xx / rate limit; retried with a
//!   fixed delay by the retry supervisor.
//! - [`SyncError::DataIntegrity`] - the persisted state contradicts itself
//!   (e.g. two remote ids claiming the same filename); the album is aborted
//!   rather than guessed at.
//! - [`SyncError::Unsupported`] - extension, content type or size outside
//!   what the remote store accepts; the file is skipped, the album continues.
//! - [`SyncError::LocalIo`] - a local file could not be read; the album is
//!   skipped for this run, since reconciling from a partial inventory could
//!   cause false deletions.

use std::path::PathBuf;

use thiserror::Error;

use crate::ports::remote_store::RemoteError;

/// Errors that can occur during synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    /// Credential invalid or expired - fatal for the whole run
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Network, server or rate-limit failure - retryable
    #[error("transient remote failure: {0}")]
    Transient(String),

    /// Persisted or derived state is inconsistent - abort, do not guess
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),

    /// File cannot be represented remotely (extension, content type, size)
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Local filesystem failure while building the inventory or ledger
    #[error("local I/O failure on {path}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Fatal errors abort the entire run without retry.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Transient(msg) => Self::Transient(msg),
            RemoteError::Unauthorized(msg) => Self::Unauthorized(msg),
            RemoteError::UnsupportedOperation(msg) => Self::Unsupported(msg),
        }
    }
}
