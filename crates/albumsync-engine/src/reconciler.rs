//! Per-album reconciliation state machine
//!
//! Given the local inventory, the persisted ledger and a snapshot of what
//! currently exists remotely, computes and applies the minimal set of
//! create/update/rename/delete operations:
//!
//! 1. **Ensure album** - create the remote album if the ledger has no live
//!    identity for it; otherwise update title/timestamp on mismatch.
//! 2. **Reconcile files** - detect renames by content checksum, upload new
//!    files, replace changed content, marking every remote id confirmed
//!    current in a "touched" set. The ledger is persisted after every
//!    remote-affecting operation.
//! 3. **Cleanup** - delete remote items not touched this run and prune
//!    their ledger entries. Deletion runs only after the full pass, so
//!    nothing is removed before its replacement is durable.
//!
//! Every transition re-derives its operations from the current ledger and
//! the current remote snapshot, never from in-memory intent, so the machine
//! is safe to re-enter from any persisted checkpoint after a crash or retry.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use albumsync_core::domain::media::{content_type_for, MediaKind, SIZE_CEILING_BYTES};
use albumsync_core::domain::{
    title, AlbumSyncState, Checksum, Inventory, LocalFile, RemoteId, SyncError,
};
use albumsync_core::ports::{IRemoteStore, RemoteAlbum, RemoteMediaItem};

use crate::ledger::LedgerStore;

/// Counters for what one album's reconciliation actually did.
#[derive(Debug, Clone, Default)]
pub struct AlbumOutcome {
    /// Identity of the remote album after reconciliation (absent only for
    /// an empty inventory, which never touches the remote).
    pub remote_album_id: Option<RemoteId>,
    pub created_album: bool,
    pub uploaded: u32,
    pub updated: u32,
    pub renamed: u32,
    pub deleted: u32,
    pub unchanged: u32,
}

/// Drives the reconciliation state machine for single albums.
pub struct Reconciler {
    remote: Arc<dyn IRemoteStore>,
}

impl Reconciler {
    pub fn new(remote: Arc<dyn IRemoteStore>) -> Self {
        Self { remote }
    }

    /// Reconciles one album directory against the remote store.
    ///
    /// `remote_albums` is the run-level snapshot of existing remote albums,
    /// keyed by id. An empty inventory is terminal success: no remote album
    /// is created and nothing is deleted.
    #[instrument(skip_all, fields(album = %album_title))]
    pub async fn reconcile_album(
        &self,
        album_dir: &Path,
        album_title: &str,
        inventory: &Inventory,
        remote_albums: &HashMap<RemoteId, RemoteAlbum>,
    ) -> Result<AlbumOutcome, SyncError> {
        let mut outcome = AlbumOutcome::default();

        if inventory.is_empty() {
            info!("inventory is empty, nothing to reconcile");
            return Ok(outcome);
        }

        let mut state = LedgerStore::load(album_dir).await?;

        let album = self
            .ensure_album(album_dir, album_title, inventory, remote_albums, &mut state, &mut outcome)
            .await?;
        outcome.remote_album_id = Some(album.id.clone());

        self.reconcile_files(album_dir, &album, inventory, &mut state, &mut outcome)
            .await?;

        info!(
            uploaded = outcome.uploaded,
            updated = outcome.updated,
            renamed = outcome.renamed,
            deleted = outcome.deleted,
            unchanged = outcome.unchanged,
            "album reconciled"
        );
        Ok(outcome)
    }

    /// `NoRemoteAlbum -> AlbumEnsured`: create the album or bring its
    /// title/timestamp up to date, persisting the ledger on every change.
    async fn ensure_album(
        &self,
        album_dir: &Path,
        album_title: &str,
        inventory: &Inventory,
        remote_albums: &HashMap<RemoteId, RemoteAlbum>,
        state: &mut AlbumSyncState,
        outcome: &mut AlbumOutcome,
    ) -> Result<RemoteAlbum, SyncError> {
        let desired_timestamp = inventory.representative_time();

        let live = state
            .remote_album_id
            .as_ref()
            .and_then(|id| remote_albums.get(id));

        match live {
            Some(album) => {
                if album.title == album_title && album.timestamp == desired_timestamp {
                    debug!(remote_id = %album.id, "remote album already up to date");
                    return Ok(album.clone());
                }
                info!(
                    remote_id = %album.id,
                    old_title = %album.title,
                    new_title = %album_title,
                    "updating remote album"
                );
                let updated = self
                    .remote
                    .update_album(album, album_title, desired_timestamp)
                    .await?;
                state.remote_album_id = Some(updated.id.clone());
                LedgerStore::save(album_dir, state).await?;
                Ok(updated)
            }
            None => {
                info!("creating remote album");
                let created = self
                    .remote
                    .create_album(album_title, desired_timestamp)
                    .await?;
                state.remote_album_id = Some(created.id.clone());
                LedgerStore::save(album_dir, state).await?;
                outcome.created_album = true;
                Ok(created)
            }
        }
    }

    /// `AlbumEnsured -> FilesReconciled -> Done`: the file-matching
    /// algorithm plus the touched-set cleanup pass.
    async fn reconcile_files(
        &self,
        album_dir: &Path,
        album: &RemoteAlbum,
        inventory: &Inventory,
        state: &mut AlbumSyncState,
        outcome: &mut AlbumOutcome,
    ) -> Result<(), SyncError> {
        let mut remote_items: HashMap<RemoteId, RemoteMediaItem> = self
            .remote
            .list_media_items(&album.id)
            .await?
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        // Fails on a non-injective ledger; reconciling on top of one could
        // rewrite or delete the wrong remote item.
        let mut filename_index = state.filename_index()?;

        // Content maps over the current inventory. Checksums appearing under
        // more than one filename are ambiguous: they cannot participate in
        // rename detection because there is no way to tell which copy moved.
        let mut checksum_to_name: HashMap<Checksum, String> = HashMap::new();
        let mut ambiguous: HashSet<Checksum> = HashSet::new();
        for file in inventory.files() {
            let name = relative_name(&file.path, album_dir);
            if checksum_to_name.contains_key(&file.checksum) {
                ambiguous.insert(file.checksum.clone());
            }
            checksum_to_name.insert(file.checksum.clone(), name);
        }

        // Rename detection: a ledger entry whose checksum now lives under a
        // different filename, where the old filename's remote item is still
        // present. Content identity is more reliable than path identity.
        let mut rename_sources: HashMap<String, String> = HashMap::new();
        for entry in state.entries.values() {
            let Some(new_name) = checksum_to_name.get(&entry.checksum) else {
                continue;
            };
            if ambiguous.contains(&entry.checksum) || *new_name == entry.filename {
                continue;
            }
            let Some(old_id) = filename_index.get(&entry.filename) else {
                continue;
            };
            if remote_items.contains_key(old_id) {
                rename_sources.insert(new_name.clone(), entry.filename.clone());
            }
        }

        let mut touched: HashSet<RemoteId> = HashSet::new();

        for file in inventory.files() {
            let filename = relative_name(&file.path, album_dir);

            if let Some(old_name) = rename_sources.get(&filename) {
                self.apply_rename(
                    album_dir, file, &filename, old_name, &filename_index, &mut remote_items,
                    state, &mut touched, outcome,
                )
                .await?;
                continue;
            }

            let live_id = filename_index
                .get(&filename)
                .filter(|id| remote_items.contains_key(*id))
                .cloned();

            match live_id {
                None => {
                    self.apply_insert(
                        album_dir, album, file, &filename, &mut filename_index,
                        &mut remote_items, state, &mut touched, outcome,
                    )
                    .await?;
                }
                Some(remote_id) => {
                    let stored_checksum = state.entries[&remote_id].checksum.clone();
                    if stored_checksum == file.checksum {
                        debug!(file = %filename, "unchanged");
                        touched.insert(remote_id);
                        outcome.unchanged += 1;
                    } else {
                        self.apply_content_change(
                            album_dir, album, file, &filename, &remote_id,
                            &mut filename_index, &mut remote_items, state, &mut touched, outcome,
                        )
                        .await?;
                    }
                }
            }
        }

        // Destructive pass, strictly last: everything still present remotely
        // but not confirmed this run no longer corresponds to a local file.
        for (remote_id, item) in &remote_items {
            if !touched.contains(remote_id) {
                info!(remote_id = %remote_id, title = %item.title, "deleting remote media item");
                self.remote.delete_media_item(item).await?;
                outcome.deleted += 1;
            }
        }

        state.retain_touched(&touched);
        LedgerStore::save(album_dir, state).await?;
        Ok(())
    }

    /// A rename keeps the remote item and its content; only the display
    /// title and the ledger filename change.
    #[allow(clippy::too_many_arguments)]
    async fn apply_rename(
        &self,
        album_dir: &Path,
        file: &LocalFile,
        filename: &str,
        old_name: &str,
        filename_index: &HashMap<String, RemoteId>,
        remote_items: &mut HashMap<RemoteId, RemoteMediaItem>,
        state: &mut AlbumSyncState,
        touched: &mut HashSet<RemoteId>,
        outcome: &mut AlbumOutcome,
    ) -> Result<(), SyncError> {
        // Both lookups were validated when the rename was detected.
        let remote_id = filename_index[old_name].clone();
        let item = remote_items[&remote_id].clone();
        let new_title = title::media_title(&file.path, album_dir);

        info!(from = %old_name, to = %filename, remote_id = %remote_id, "renaming remote media item");
        let updated = self.remote.update_media_item_title(&item, &new_title).await?;

        state.record(updated.id.clone(), filename.to_string(), file.checksum.clone());
        touched.insert(updated.id.clone());
        remote_items.insert(updated.id.clone(), updated);
        outcome.renamed += 1;
        LedgerStore::save(album_dir, state).await
    }

    /// Uploads a file with no live remote counterpart. Unsupported
    /// extensions and oversized files are skipped, not failed.
    #[allow(clippy::too_many_arguments)]
    async fn apply_insert(
        &self,
        album_dir: &Path,
        album: &RemoteAlbum,
        file: &LocalFile,
        filename: &str,
        filename_index: &mut HashMap<String, RemoteId>,
        remote_items: &mut HashMap<RemoteId, RemoteMediaItem>,
        state: &mut AlbumSyncState,
        touched: &mut HashSet<RemoteId>,
        outcome: &mut AlbumOutcome,
    ) -> Result<(), SyncError> {
        let Some((content_type, _)) = content_type_for(&file.path) else {
            warn!(file = %filename, "unsupported extension, skipping");
            return Ok(());
        };
        if file.size >= SIZE_CEILING_BYTES {
            warn!(
                file = %filename,
                size_mib = file.size / (1024 * 1024),
                "file exceeds size ceiling, leaving un-synced"
            );
            return Ok(());
        }

        info!(file = %filename, content_type, "uploading new media item");
        let item = self
            .remote
            .insert_media_item(
                &album.id,
                &title::media_title(&file.path, album_dir),
                &file.path,
                content_type,
            )
            .await?;

        state.record(item.id.clone(), filename.to_string(), file.checksum.clone());
        filename_index.insert(filename.to_string(), item.id.clone());
        touched.insert(item.id.clone());
        remote_items.insert(item.id.clone(), item);
        outcome.uploaded += 1;
        LedgerStore::save(album_dir, state).await
    }

    /// Replaces changed content: in place for images; videos cannot be
    /// rewritten remotely, so a fresh item is inserted and the stale one is
    /// left for the cleanup pass.
    #[allow(clippy::too_many_arguments)]
    async fn apply_content_change(
        &self,
        album_dir: &Path,
        album: &RemoteAlbum,
        file: &LocalFile,
        filename: &str,
        remote_id: &RemoteId,
        filename_index: &mut HashMap<String, RemoteId>,
        remote_items: &mut HashMap<RemoteId, RemoteMediaItem>,
        state: &mut AlbumSyncState,
        touched: &mut HashSet<RemoteId>,
        outcome: &mut AlbumOutcome,
    ) -> Result<(), SyncError> {
        let Some((content_type, kind)) = content_type_for(&file.path) else {
            warn!(file = %filename, "unsupported extension, cannot update content");
            return Ok(());
        };
        if file.size >= SIZE_CEILING_BYTES {
            warn!(
                file = %filename,
                size_mib = file.size / (1024 * 1024),
                "changed file exceeds size ceiling, cannot update content"
            );
            return Ok(());
        }

        match kind {
            MediaKind::Image => {
                let item = remote_items[remote_id].clone();
                info!(file = %filename, remote_id = %remote_id, "replacing image content");
                let updated = self
                    .remote
                    .update_media_item_content(&item, &file.path, content_type)
                    .await?;
                state.record(updated.id.clone(), filename.to_string(), file.checksum.clone());
                touched.insert(updated.id.clone());
                remote_items.insert(updated.id.clone(), updated);
            }
            MediaKind::Video => {
                // The stale item keeps its id, goes untouched and is removed
                // by the cleanup pass after the replacement is durable.
                info!(file = %filename, remote_id = %remote_id, "video content changed, inserting replacement");
                let item = self
                    .remote
                    .insert_media_item(
                        &album.id,
                        &title::media_title(&file.path, album_dir),
                        &file.path,
                        content_type,
                    )
                    .await?;
                state.record(item.id.clone(), filename.to_string(), file.checksum.clone());
                filename_index.insert(filename.to_string(), item.id.clone());
                touched.insert(item.id.clone());
                remote_items.insert(item.id.clone(), item);
            }
        }
        outcome.updated += 1;
        LedgerStore::save(album_dir, state).await
    }
}

/// Ledger filenames are stored relative to the album directory.
fn relative_name(path: &Path, album_dir: &Path) -> String {
    path.strip_prefix(album_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
