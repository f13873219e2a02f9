//! Domain entities and business logic
//!
//! This module contains the core domain types for albumsync:
//! - Newtypes for type-safe identifiers
//! - Media classification and content-type mapping
//! - The local inventory model (fingerprinted files, ordered by capture time)
//! - The sync ledger (durable remote-id to filename/checksum mapping)
//! - Title derivation rules
//! - The error taxonomy

pub mod errors;
pub mod ledger;
pub mod media;
pub mod newtypes;
pub mod title;

// Re-export commonly used types
pub use errors::SyncError;
pub use ledger::{AlbumSyncState, LedgerEntry};
pub use media::{content_type_for, Inventory, LocalFile, MediaKind, SIZE_CEILING_BYTES};
pub use newtypes::{Checksum, RemoteId};
