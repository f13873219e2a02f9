//! Media classification and the local inventory model
//!
//! The remote store only accepts a fixed set of extensions; everything else
//! is never uploaded. Video content cannot be replaced in place remotely,
//! which is why the reconciler needs to know the [`MediaKind`] of a file, not
//! just its MIME type.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::Checksum;

/// Files at or above this size are never uploaded or content-updated.
///
/// The same threshold also switches the fingerprinter to its cheap
/// `path + size` fallback identity.
pub const SIZE_CEILING_BYTES: u64 = 100 * 1024 * 1024;

/// Whether a media file is a still image or a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
}

/// Maps a file extension to its upload content type and media kind.
///
/// Returns `None` for extensions the remote store does not accept; such
/// files are skipped, never uploaded.
#[must_use]
pub fn content_type_for(path: &Path) -> Option<(&'static str, MediaKind)> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some(("image/jpeg", MediaKind::Image)),
        "bmp" => Some(("image/bmp", MediaKind::Image)),
        "gif" => Some(("image/gif", MediaKind::Image)),
        "png" => Some(("image/png", MediaKind::Image)),
        "mov" | "mpg" | "mpeg" => Some(("video/mpeg", MediaKind::Video)),
        _ => None,
    }
}

/// True if the extension denotes a recognized video type.
#[must_use]
pub fn is_video_extension(extension: &str) -> bool {
    matches!(
        extension.to_ascii_lowercase().as_str(),
        "mov" | "mpg" | "mpeg"
    )
}

/// True if the extension denotes a recognized image type.
#[must_use]
pub fn is_image_extension(extension: &str) -> bool {
    matches!(
        extension.to_ascii_lowercase().as_str(),
        "jpg" | "jpeg" | "bmp" | "gif" | "png"
    )
}

/// A fingerprinted local file.
///
/// Produced fresh every run by the inventory builder; immutable once
/// computed. Identity within a run is the `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Absolute path of the file on disk.
    pub path: PathBuf,
    /// Content identity (see [`Checksum`] for the oversize fallback caveat).
    pub checksum: Checksum,
    /// Best-effort capture timestamp, falling back to filesystem mtime.
    pub capture_time: DateTime<Utc>,
    /// File size in bytes, used for the upload size ceiling.
    pub size: u64,
}

/// Ordered inventory of the fingerprinted files in one album directory.
///
/// Invariants:
/// - sorted ascending by capture time, ties keeping traversal order;
/// - video-thumbnail companion images have already been excluded.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    files: Vec<LocalFile>,
}

impl Inventory {
    /// Builds an inventory from files in traversal order, applying the
    /// capture-time ordering invariant (stable sort).
    #[must_use]
    pub fn from_files(mut files: Vec<LocalFile>) -> Self {
        files.sort_by_key(|f| f.capture_time);
        Self { files }
    }

    #[must_use]
    pub fn files(&self) -> &[LocalFile] {
        &self.files
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Album-level representative timestamp: the capture time of the oldest
    /// file, or the current time for an empty inventory.
    #[must_use]
    pub fn representative_time(&self) -> DateTime<Utc> {
        self.files
            .first()
            .map(|f| f.capture_time)
            .unwrap_or_else(Utc::now)
    }
}
