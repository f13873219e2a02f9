//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are interfaces the domain core depends on, but whose
//! implementations live elsewhere:
//!
//! - [`IRemoteStore`] - the remote photo-album store (list/create/update/
//!   delete for albums and media items). Authentication and transport are
//!   the adapter's concern and never appear here.
//! - [`ICaptureTimeSource`] - best-effort capture timestamp lookup for a
//!   local file (EXIF or similar); the engine ships an mtime-only fallback.

pub mod capture_time;
pub mod remote_store;

pub use capture_time::ICaptureTimeSource;
pub use remote_store::{IRemoteStore, RemoteAlbum, RemoteError, RemoteMediaItem};
