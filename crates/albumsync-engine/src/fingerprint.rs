//! Content fingerprinting
//!
//! Computes the `(checksum, capture_time)` pair identifying a local file's
//! content and chronological position.
//!
//! ## Design Decisions
//!
//! - **Streaming SHA-256**: content is hashed in 1 MiB chunks so large
//!   photos never sit in memory whole; the digest is base64-encoded.
//! - **Oversize fallback**: files at or above the hashing ceiling (100 MiB
//!   by default) get a hash of `path + size` instead of their content. This
//!   trades collision risk for I/O cost: a large file replaced by different
//!   content of the same size at the same path is classified as unchanged.
//! - **Capture time never fails the run**: the capture-time port is asked
//!   first; any miss degrades to filesystem mtime, and an unreadable mtime
//!   degrades to the current time.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use albumsync_core::domain::media::SIZE_CEILING_BYTES;
use albumsync_core::domain::{Checksum, SyncError};
use albumsync_core::ports::ICaptureTimeSource;

/// Read buffer size for streaming content hashes.
const HASH_CHUNK_BYTES: usize = 1024 * 1024;

/// A capture-time source that never finds embedded metadata.
///
/// Using it makes every capture time fall back to filesystem mtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCaptureMetadata;

#[async_trait::async_trait]
impl ICaptureTimeSource for NoCaptureMetadata {
    async fn capture_time(&self, _path: &Path) -> Option<DateTime<Utc>> {
        None
    }
}

/// Computes content checksums and capture timestamps for local files.
pub struct Fingerprinter {
    capture_source: Arc<dyn ICaptureTimeSource>,
    content_hash_ceiling: u64,
}

impl Fingerprinter {
    pub fn new(capture_source: Arc<dyn ICaptureTimeSource>) -> Self {
        Self {
            capture_source,
            content_hash_ceiling: SIZE_CEILING_BYTES,
        }
    }

    /// Overrides the size at which content hashing switches to the
    /// `path + size` fallback. Mainly useful in tests.
    #[must_use]
    pub fn with_content_hash_ceiling(mut self, bytes: u64) -> Self {
        self.content_hash_ceiling = bytes;
        self
    }

    /// Fingerprints one file: `(checksum, capture_time, size)`.
    ///
    /// Any read failure is a [`SyncError::LocalIo`]; the caller aborts the
    /// album's inventory rather than reconcile from a partial one.
    pub async fn fingerprint(
        &self,
        path: &Path,
    ) -> Result<(Checksum, DateTime<Utc>, u64), SyncError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| SyncError::local_io(path, e))?;
        let size = metadata.len();

        let checksum = if size < self.content_hash_ceiling {
            self.content_checksum(path).await?
        } else {
            debug!(path = %path.display(), size, "file above hashing ceiling, using path+size identity");
            fallback_checksum(path, size)
        };

        let capture_time = match self.capture_source.capture_time(path).await {
            Some(ts) => ts,
            None => match metadata.modified() {
                Ok(mtime) => DateTime::<Utc>::from(mtime),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "mtime unavailable, using current time");
                    Utc::now()
                }
            },
        };

        Ok((checksum, capture_time, size))
    }

    async fn content_checksum(&self, path: &Path) -> Result<Checksum, SyncError> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| SyncError::local_io(path, e))?;

        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; HASH_CHUNK_BYTES];
        loop {
            let n = file
                .read(&mut buf)
                .await
                .map_err(|e| SyncError::local_io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(encode_digest(hasher))
    }
}

/// Cheap identity for oversized files: a hash over the path string and the
/// byte size, not the content.
fn fallback_checksum(path: &Path, size: u64) -> Checksum {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(size.to_string().as_bytes());
    encode_digest(hasher)
}

fn encode_digest(hasher: Sha256) -> Checksum {
    let digest = hasher.finalize();
    Checksum::new(base64::engine::general_purpose::STANDARD.encode(digest))
}
