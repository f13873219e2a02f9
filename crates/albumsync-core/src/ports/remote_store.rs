//! Remote store port (driven/secondary port)
//!
//! Capability interface for the remote photo-album store. The reconciler
//! only ever talks to the remote through this trait; the concrete adapter
//! owns authentication, HTTP framing and pagination.
//!
//! ## Design Notes
//!
//! - Errors carry a typed classification ([`RemoteError`]) so callers switch
//!   on kind, never on message text.
//! - `RemoteAlbum` and `RemoteMediaItem` are read-only snapshots of what the
//!   store reports; the reconciler never mutates them in place.
//! - Media insertion takes a file path rather than bytes: uploads stream
//!   from disk and the adapter decides how.

use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::newtypes::RemoteId;

/// Failure classes a remote operation can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Network failure, server error or rate limit - safe to retry.
    #[error("transient remote failure: {0}")]
    Transient(String),

    /// Credential invalid or expired - not retryable.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The store cannot perform this operation on this item (e.g. in-place
    /// content replacement of a video).
    #[error("unsupported remote operation: {0}")]
    UnsupportedOperation(String),
}

/// A remote album as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAlbum {
    pub id: RemoteId,
    pub title: String,
    /// Representative timestamp shown for the album.
    pub timestamp: DateTime<Utc>,
    /// Number of media items the store reports for the album.
    pub media_count: u64,
}

/// A remote media item as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMediaItem {
    pub id: RemoteId,
    pub title: String,
}

/// Port trait for the remote photo-album store.
///
/// Every call may fail with [`RemoteError::Transient`] or
/// [`RemoteError::Unauthorized`]; operation-specific restrictions surface as
/// [`RemoteError::UnsupportedOperation`].
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Lists all albums visible to the authenticated user.
    async fn list_albums(&self) -> Result<Vec<RemoteAlbum>, RemoteError>;

    /// Creates an album with the given title and representative timestamp.
    async fn create_album(
        &self,
        title: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<RemoteAlbum, RemoteError>;

    /// Rewrites an album's title and representative timestamp.
    async fn update_album(
        &self,
        album: &RemoteAlbum,
        title: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<RemoteAlbum, RemoteError>;

    /// Deletes an album and its contents.
    async fn delete_album(&self, album: &RemoteAlbum) -> Result<(), RemoteError>;

    /// Lists the media items of one album.
    async fn list_media_items(
        &self,
        album_id: &RemoteId,
    ) -> Result<Vec<RemoteMediaItem>, RemoteError>;

    /// Uploads a new media item into an album.
    async fn insert_media_item(
        &self,
        album_id: &RemoteId,
        title: &str,
        file_path: &Path,
        content_type: &str,
    ) -> Result<RemoteMediaItem, RemoteError>;

    /// Rewrites a media item's display title, keeping its content.
    async fn update_media_item_title(
        &self,
        item: &RemoteMediaItem,
        title: &str,
    ) -> Result<RemoteMediaItem, RemoteError>;

    /// Replaces a media item's binary content in place.
    ///
    /// Image types only; the store reports
    /// [`RemoteError::UnsupportedOperation`] for video content.
    async fn update_media_item_content(
        &self,
        item: &RemoteMediaItem,
        file_path: &Path,
        content_type: &str,
    ) -> Result<RemoteMediaItem, RemoteError>;

    /// Deletes a media item.
    async fn delete_media_item(&self, item: &RemoteMediaItem) -> Result<(), RemoteError>;
}
