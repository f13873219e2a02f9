//! Durable ledger storage
//!
//! One hidden YAML record per album directory, holding the remote album
//! identity and the full `remote_id -> (filename, checksum)` map.
//!
//! ## Design Decisions
//!
//! - **Atomic overwrite**: every save writes the full record to a temporary
//!   file in the same directory and renames it into place, so a crash leaves
//!   either the old record or the new one, never a torn file.
//! - **Absent file means empty state**: the first sync of a directory starts
//!   from an empty ledger.
//! - **Legacy filename hygiene**: records written by older tools may carry
//!   filenames as raw byte sequences; they are normalized to UTF-8 (lossily)
//!   on load. Data hygiene, not business logic.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use albumsync_core::domain::{AlbumSyncState, Checksum, LedgerEntry, RemoteId, SyncError};

/// Name of the per-album state file.
pub const STATE_FILE_NAME: &str = ".albumsync-state";

/// Loads and saves [`AlbumSyncState`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerStore;

/// On-disk shape of the record, tolerant of legacy byte-string filenames.
#[derive(Debug, Deserialize)]
struct RawState {
    #[serde(default)]
    remote_album_id: Option<String>,
    #[serde(default)]
    entries: BTreeMap<String, RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    filename: LegacyText,
    checksum: String,
}

/// A string that may have been persisted as raw bytes by an older tool.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyText {
    Text(String),
    Bytes(Vec<u8>),
}

impl LegacyText {
    fn into_normalized(self, context: &Path) -> String {
        match self {
            Self::Text(s) => s,
            Self::Bytes(bytes) => {
                let normalized = String::from_utf8_lossy(&bytes).into_owned();
                warn!(
                    ledger = %context.display(),
                    filename = %normalized,
                    "normalized legacy byte-string filename"
                );
                normalized
            }
        }
    }
}

impl LedgerStore {
    /// Path of the state file inside an album directory.
    #[must_use]
    pub fn state_path(album_dir: &Path) -> PathBuf {
        album_dir.join(STATE_FILE_NAME)
    }

    /// Loads the album's sync state; an absent file yields an empty state.
    ///
    /// A present-but-unparsable record is a [`SyncError::DataIntegrity`]:
    /// reconciling on top of a guessed ledger could delete the wrong items.
    #[instrument(skip(album_dir), fields(album_dir = %album_dir.display()))]
    pub async fn load(album_dir: &Path) -> Result<AlbumSyncState, SyncError> {
        let path = Self::state_path(album_dir);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no ledger record, starting empty");
                return Ok(AlbumSyncState::default());
            }
            Err(e) => return Err(SyncError::local_io(&path, e)),
        };

        let raw: RawState = serde_yaml::from_str(&content).map_err(|e| {
            SyncError::DataIntegrity(format!("corrupt ledger record {}: {e}", path.display()))
        })?;

        let mut state = AlbumSyncState {
            remote_album_id: raw.remote_album_id.map(RemoteId::new),
            ..Default::default()
        };
        // Entries go in verbatim, not through `record()`: a damaged record
        // with two ids claiming one filename must surface through
        // `filename_index()`, not be silently repaired here.
        for (remote_id, entry) in raw.entries {
            state.entries.insert(
                RemoteId::new(remote_id),
                LedgerEntry {
                    filename: entry.filename.into_normalized(&path),
                    checksum: Checksum::new(entry.checksum),
                },
            );
        }

        debug!(entries = state.entries.len(), "ledger loaded");
        Ok(state)
    }

    /// Atomically rewrites the album's sync state.
    #[instrument(skip(album_dir, state), fields(album_dir = %album_dir.display()))]
    pub async fn save(album_dir: &Path, state: &AlbumSyncState) -> Result<(), SyncError> {
        let path = Self::state_path(album_dir);
        let yaml = serde_yaml::to_string(state).map_err(|e| {
            SyncError::DataIntegrity(format!("cannot serialize ledger record: {e}"))
        })?;

        // Temp file in the same directory so the rename stays on one
        // filesystem and is atomic.
        let tmp_path = {
            let mut p = path.as_os_str().to_owned();
            p.push(".tmp");
            PathBuf::from(p)
        };

        tokio::fs::write(&tmp_path, yaml.as_bytes())
            .await
            .map_err(|e| SyncError::local_io(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| SyncError::local_io(&path, e))?;

        debug!(entries = state.entries.len(), "ledger saved");
        Ok(())
    }
}
