//! Local inventory builder
//!
//! Walks one album directory, applies the include/exclude filters, drops
//! video-thumbnail companion images, fingerprints what remains and returns
//! the capture-time-ordered [`Inventory`].
//!
//! Failure model: any unreadable file aborts the whole build for that album.
//! A truncated inventory is never returned, because a missing file would
//! look like a deletion to the reconciler.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use albumsync_core::domain::media::{is_image_extension, is_video_extension};
use albumsync_core::domain::{Inventory, LocalFile, SyncError};

use crate::fingerprint::Fingerprinter;

/// Compiles glob patterns, logging and skipping invalid ones.
pub(crate) fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(pattern = %raw, error = %e, "skipping invalid glob pattern");
                None
            }
        })
        .collect()
}

/// Case-insensitive match of `name` against any of the patterns.
pub(crate) fn matches_any(name: &str, patterns: &[Pattern]) -> bool {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    patterns.iter().any(|p| p.matches_with(name, options))
}

/// Builds the ordered, filtered inventory of one album directory.
pub struct InventoryBuilder {
    fingerprinter: Fingerprinter,
    include: Vec<Pattern>,
    exclude_dirs: Vec<Pattern>,
}

impl InventoryBuilder {
    pub fn new(fingerprinter: Fingerprinter, include: &[String], exclude_dirs: &[String]) -> Self {
        Self {
            fingerprinter,
            include: compile_patterns(include),
            exclude_dirs: compile_patterns(exclude_dirs),
        }
    }

    /// Walks `root` and produces the album inventory.
    ///
    /// Symbolic links are never followed or included (cycle safety), and
    /// directories whose name matches an exclude pattern are pruned whole.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub async fn build(&self, root: &Path) -> Result<Inventory, SyncError> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        let mut video_stems: HashSet<PathBuf> = HashSet::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                if entry.path_is_symlink() {
                    debug!(path = %entry.path().display(), "skipping symlink");
                    return false;
                }
                if entry.file_type().is_dir() {
                    let name = entry.file_name().to_string_lossy();
                    if matches_any(&name, &self.exclude_dirs) {
                        debug!(path = %entry.path().display(), "pruning excluded directory");
                        return false;
                    }
                }
                true
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                SyncError::local_io(path, e.into())
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !matches_any(&name, &self.include) {
                continue;
            }

            let path = entry.into_path();
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if is_video_extension(ext) {
                    video_stems.insert(path.with_extension(""));
                }
            }
            candidates.push(path);
        }

        let mut files = Vec::with_capacity(candidates.len());
        for path in candidates {
            // An image sharing its stem with a recognized video is assumed to
            // be an auto-generated poster frame.
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if is_image_extension(ext) && video_stems.contains(&path.with_extension("")) {
                info!(path = %path.display(), "image assumed to be a movie thumbnail, skipping");
                continue;
            }

            let (checksum, capture_time, size) = self.fingerprinter.fingerprint(&path).await?;
            debug!(path = %path.display(), capture_time = %capture_time, "fingerprinted");
            files.push(LocalFile {
                path,
                checksum,
                capture_time,
                size,
            });
        }

        let inventory = Inventory::from_files(files);
        debug!(files = inventory.len(), "inventory built");
        Ok(inventory)
    }
}
