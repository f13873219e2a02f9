//! Capture-time port (driven/secondary port)
//!
//! Best-effort lookup of the moment a photo or video was captured, used to
//! order the inventory and to stamp the remote album. Metadata extraction is
//! an adapter concern; the engine falls back to filesystem modification time
//! whenever the source has nothing to offer.

use std::path::Path;

use chrono::{DateTime, Utc};

/// Port trait for best-effort capture timestamp extraction.
///
/// Implementations must never fail the run: any extraction problem is
/// reported as `None` and the caller degrades to the mtime fallback.
#[async_trait::async_trait]
pub trait ICaptureTimeSource: Send + Sync {
    /// Returns the embedded capture timestamp of the file, if one can be
    /// extracted and parsed.
    async fn capture_time(&self, path: &Path) -> Option<DateTime<Utc>>;
}
