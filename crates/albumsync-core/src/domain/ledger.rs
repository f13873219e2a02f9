//! Sync ledger entities
//!
//! The ledger is the durable record of the last known mapping between remote
//! item identities and local filename/checksum pairs, one record per album
//! directory. It is the reconciler's memory across runs: rename detection,
//! change detection and deletion safety all derive from it.
//!
//! The ledger is an explicit value passed through the reconciler and
//! persisted atomically by the engine's `LedgerStore`; there is no shared
//! global state.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::errors::SyncError;
use super::newtypes::{Checksum, RemoteId};

/// Last-known local identity of one remote media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Filename relative to the album directory, as of the last sync.
    pub filename: String,
    /// Content checksum as of the last sync.
    pub checksum: Checksum,
}

/// Durable per-album synchronization state.
///
/// Lifecycle: created empty on the first sync of a directory, loaded at the
/// start of every run, rewritten in full after every remote-affecting
/// operation. A crash therefore loses at most the in-flight operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSyncState {
    /// Identity of the remote album, absent until the first create succeeds.
    pub remote_album_id: Option<RemoteId>,
    /// Remote item id -> last-known local filename/checksum.
    ///
    /// A `BTreeMap` keeps the serialized record deterministic.
    pub entries: BTreeMap<RemoteId, LedgerEntry>,
}

impl AlbumSyncState {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remote_album_id.is_none() && self.entries.is_empty()
    }

    /// Records (or rewrites) the ledger entry for a remote item.
    ///
    /// Any other entry claiming the same filename is evicted first, keeping
    /// the filename index injective in every persisted checkpoint. The
    /// evicted entry's remote item is not lost: its deletion is driven by
    /// the remote listing and the touched set, not by the ledger.
    pub fn record(&mut self, remote_id: RemoteId, filename: String, checksum: Checksum) {
        self.entries.retain(|_, entry| entry.filename != filename);
        self.entries
            .insert(remote_id, LedgerEntry { filename, checksum });
    }

    /// Derived inverse index: filename -> remote id.
    ///
    /// The map must be injective in practice; two remote ids claiming the
    /// same filename means the persisted state is corrupt, and reconciling
    /// on top of it could update or delete the wrong remote item.
    pub fn filename_index(&self) -> Result<HashMap<String, RemoteId>, SyncError> {
        let mut index = HashMap::with_capacity(self.entries.len());
        for (remote_id, entry) in &self.entries {
            if let Some(previous) = index.insert(entry.filename.clone(), remote_id.clone()) {
                return Err(SyncError::DataIntegrity(format!(
                    "filename '{}' is claimed by remote items {} and {}",
                    entry.filename, previous, remote_id
                )));
            }
        }
        Ok(index)
    }

    /// Keeps only the entries whose remote id was confirmed current this run.
    ///
    /// Computes the surviving set first and then materializes the new map,
    /// rather than deleting while iterating.
    pub fn retain_touched(&mut self, touched: &HashSet<RemoteId>) {
        let survivors: BTreeMap<RemoteId, LedgerEntry> = self
            .entries
            .iter()
            .filter(|(remote_id, _)| touched.contains(*remote_id))
            .map(|(remote_id, entry)| (remote_id.clone(), entry.clone()))
            .collect();
        self.entries = survivors;
    }
}
