//! Whole-run driver
//!
//! Enumerates the local album directories, reconciles each one in
//! descending name order under the retry supervisor, then runs the two
//! cleanup passes:
//!
//! 1. Orphan albums: remote albums with no local counterpart this run,
//!    deleted only when `delete_remote_albums_not_local` is set.
//! 2. Empty albums: remote albums holding no media, deleted unconditionally.
//!
//! Both passes honor `never_delete_albums`, and both re-list the remote
//! store on every retry attempt so work completed by an earlier attempt is
//! not repeated.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use albumsync_core::config::Config;
use albumsync_core::domain::{title, Inventory, RemoteId, SyncError};
use albumsync_core::ports::{ICaptureTimeSource, IRemoteStore, RemoteAlbum};

use crate::fingerprint::Fingerprinter;
use crate::inventory::{compile_patterns, matches_any, InventoryBuilder};
use crate::ledger::LedgerStore;
use crate::reconciler::{AlbumOutcome, Reconciler};
use crate::retry::RetrySupervisor;

/// Aggregated counters for one complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub albums_synced: u32,
    pub albums_skipped: u32,
    pub items_uploaded: u32,
    pub items_updated: u32,
    pub items_renamed: u32,
    pub items_deleted: u32,
    pub albums_deleted: u32,
}

/// Drives one full synchronization run.
pub struct SyncRunner {
    config: Config,
    remote: Arc<dyn IRemoteStore>,
    inventory: InventoryBuilder,
    reconciler: Reconciler,
    supervisor: RetrySupervisor,
}

impl SyncRunner {
    pub fn new(
        config: Config,
        remote: Arc<dyn IRemoteStore>,
        capture_source: Arc<dyn ICaptureTimeSource>,
    ) -> Self {
        let inventory = InventoryBuilder::new(
            Fingerprinter::new(capture_source),
            &config.include_files,
            &config.exclude_dirs,
        );
        let reconciler = Reconciler::new(Arc::clone(&remote));
        let supervisor = RetrySupervisor::new(&config.retry);
        Self {
            config,
            remote,
            inventory,
            reconciler,
            supervisor,
        }
    }

    /// Performs one full run: per-album reconciliation, then cleanup.
    ///
    /// The run aborts on the first error that survives its retry budget; a
    /// partial run is safe to resume because the ledger reflects exactly
    /// what has been applied so far.
    #[instrument(skip(self), fields(photo_dir = %self.config.photo_dir.display()))]
    pub async fn run(&self) -> Result<RunSummary, SyncError> {
        let mut summary = RunSummary::default();

        // One unretried listing up front: if the store is unreachable there
        // is no point walking the local tree at all.
        let run_start: HashMap<RemoteId, RemoteAlbum> = self
            .remote
            .list_albums()
            .await
            .map_err(SyncError::from)?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();
        info!(remote_albums = run_start.len(), "remote store listed");

        // Remote album ids confirmed to belong to a local directory this
        // run. Everything else is a candidate for the orphan cleanup.
        let mut claimed: HashSet<RemoteId> = HashSet::new();

        for dir in self.local_album_dirs().await? {
            let dir_name = match dir.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };
            let album_title = title::album_title(&dir_name).to_string();

            let state = match LedgerStore::load(&dir).await {
                Ok(state) => state,
                Err(e) => {
                    error!(album = %album_title, error = %e, "cannot load ledger, skipping album");
                    summary.albums_skipped += 1;
                    continue;
                }
            };
            let already_remote = state
                .remote_album_id
                .as_ref()
                .filter(|id| run_start.contains_key(*id))
                .cloned();
            if let Some(id) = already_remote {
                claimed.insert(id.clone());
                if !self.config.update_albums_already_remote {
                    info!(album = %album_title, remote_id = %id, "album already remote, skipping");
                    summary.albums_skipped += 1;
                    continue;
                }
            }

            let inventory = match self.inventory.build(&dir).await {
                Ok(inventory) => inventory,
                Err(e) => {
                    error!(album = %album_title, error = %e, "cannot build inventory, skipping album");
                    summary.albums_skipped += 1;
                    continue;
                }
            };

            let outcome = self
                .supervisor
                .run("reconcile-album", || {
                    self.reconcile_attempt(&dir, &album_title, &inventory)
                })
                .await?;

            if let Some(id) = &outcome.remote_album_id {
                claimed.insert(id.clone());
            }
            summary.albums_synced += 1;
            summary.items_uploaded += outcome.uploaded;
            summary.items_updated += outcome.updated;
            summary.items_renamed += outcome.renamed;
            summary.items_deleted += outcome.deleted;
        }

        if self.config.delete_remote_albums_not_local {
            summary.albums_deleted += self.delete_orphan_albums(&claimed).await?;
        }
        summary.albums_deleted += self.delete_empty_albums().await?;

        info!(
            albums_synced = summary.albums_synced,
            albums_skipped = summary.albums_skipped,
            items_uploaded = summary.items_uploaded,
            items_updated = summary.items_updated,
            items_renamed = summary.items_renamed,
            items_deleted = summary.items_deleted,
            albums_deleted = summary.albums_deleted,
            "run complete"
        );
        Ok(summary)
    }

    /// One reconciliation attempt. Re-lists the remote albums first so that
    /// an album created by a failed earlier attempt is found, not duplicated.
    async fn reconcile_attempt(
        &self,
        dir: &Path,
        album_title: &str,
        inventory: &Inventory,
    ) -> Result<AlbumOutcome, SyncError> {
        let albums: HashMap<RemoteId, RemoteAlbum> = self
            .remote
            .list_albums()
            .await
            .map_err(SyncError::from)?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();
        self.reconciler
            .reconcile_album(dir, album_title, inventory, &albums)
            .await
    }

    /// Immediate subdirectories of `photo_dir`, excluded names and symlinks
    /// removed, in descending case-insensitive name order.
    async fn local_album_dirs(&self) -> Result<Vec<PathBuf>, SyncError> {
        let root = &self.config.photo_dir;
        let exclude = compile_patterns(&self.config.exclude_dirs);

        let mut dirs: Vec<(String, PathBuf)> = Vec::new();
        let mut entries = tokio::fs::read_dir(root)
            .await
            .map_err(|e| SyncError::local_io(root, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SyncError::local_io(root, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| SyncError::local_io(entry.path(), e))?;
            if !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if matches_any(&name, &exclude) {
                info!(dir = %name, "directory excluded from run");
                continue;
            }
            dirs.push((name.to_lowercase(), entry.path()));
        }

        dirs.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(dirs.into_iter().map(|(_, path)| path).collect())
    }

    /// Deletes remote albums no local directory claimed this run.
    async fn delete_orphan_albums(&self, claimed: &HashSet<RemoteId>) -> Result<u32, SyncError> {
        let deleted = AtomicU32::new(0);
        self.supervisor
            .run("delete-orphan-albums", || {
                self.orphan_deletion_attempt(claimed, &deleted)
            })
            .await?;
        Ok(deleted.into_inner())
    }

    /// One orphan-deletion attempt over a fresh album listing; albums
    /// removed by an earlier attempt simply no longer show up.
    async fn orphan_deletion_attempt(
        &self,
        claimed: &HashSet<RemoteId>,
        deleted: &AtomicU32,
    ) -> Result<(), SyncError> {
        for album in self.remote.list_albums().await? {
            if claimed.contains(&album.id) {
                continue;
            }
            if self.is_protected(&album.title) {
                warn!(album = %album.title, "orphan album protected, keeping");
                continue;
            }
            info!(album = %album.title, remote_id = %album.id, "deleting orphan remote album");
            self.remote.delete_album(&album).await?;
            deleted.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Deletes remote albums that hold no media at all. Runs on every sync,
    /// independent of the orphan-deletion switch.
    async fn delete_empty_albums(&self) -> Result<u32, SyncError> {
        let deleted = AtomicU32::new(0);
        self.supervisor
            .run("delete-empty-albums", || self.empty_deletion_attempt(&deleted))
            .await?;
        Ok(deleted.into_inner())
    }

    async fn empty_deletion_attempt(&self, deleted: &AtomicU32) -> Result<(), SyncError> {
        for album in self.remote.list_albums().await? {
            if album.media_count > 0 || self.is_protected(&album.title) {
                continue;
            }
            info!(album = %album.title, remote_id = %album.id, "deleting empty remote album");
            self.remote.delete_album(&album).await?;
            deleted.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_protected(&self, album_title: &str) -> bool {
        self.config
            .never_delete_albums
            .iter()
            .any(|t| t == album_title)
    }
}
