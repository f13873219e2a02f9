//! Albumsync Engine - the reconciliation engine
//!
//! Keeps a remote photo-album store consistent with a local directory tree:
//! one local album directory maps to one remote album whose media set
//! mirrors the local files, tracking renames, content changes and deletions
//! across repeated runs without re-uploading unchanged content.
//!
//! ## Modules
//!
//! - [`fingerprint`] - content checksums and capture timestamps
//! - [`inventory`] - filtered directory walk producing an ordered inventory
//! - [`ledger`] - durable per-album sync state, saved atomically
//! - [`reconciler`] - the per-album state machine computing and applying
//!   the minimal create/update/rename/delete operation set
//! - [`retry`] - bounded fixed-delay retry around remote-facing work
//! - [`runner`] - whole-run driver: album enumeration and cleanup passes
//!
//! Reconciliation is strictly sequential: one album at a time, one remote
//! operation at a time, with the ledger persisted after every durable remote
//! effect. Correctness across interrupted runs depends on that ordering.

pub mod fingerprint;
pub mod inventory;
pub mod ledger;
pub mod reconciler;
pub mod retry;
pub mod runner;

pub use fingerprint::{Fingerprinter, NoCaptureMetadata};
pub use inventory::InventoryBuilder;
pub use ledger::LedgerStore;
pub use reconciler::{AlbumOutcome, Reconciler};
pub use retry::RetrySupervisor;
pub use runner::{RunSummary, SyncRunner};
