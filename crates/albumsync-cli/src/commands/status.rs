//! Status command - compare local albums against the sync ledger
//!
//! Provides the `albumsync status` CLI command which walks the configured
//! photo directory and reports, per album, how the local files relate to
//! the last recorded sync: new, changed, unchanged and missing entries.
//! Purely local; the remote store is never contacted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use albumsync_core::config::Config;
use albumsync_core::domain::title;
use albumsync_engine::{Fingerprinter, InventoryBuilder, LedgerStore, NoCaptureMetadata};

use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Restrict the report to one album directory name
    pub album: Option<String>,
}

/// Per-album comparison of local files against the ledger.
#[derive(Debug, Default, Serialize)]
struct AlbumStatus {
    title: String,
    synced_before: bool,
    new: Vec<String>,
    changed: Vec<String>,
    unchanged: u32,
    missing: Vec<String>,
}

impl StatusCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let builder = InventoryBuilder::new(
            Fingerprinter::new(Arc::new(NoCaptureMetadata)),
            &config.include_files,
            &config.exclude_dirs,
        );

        let mut reports = Vec::new();
        for dir in album_dirs(&config.photo_dir, &self.album)? {
            match album_status(&builder, &dir).await {
                Ok(status) => reports.push(status),
                Err(e) => format.error(&format!("{}: {e}", dir.display())),
            }
        }
        info!(albums = reports.len(), "status computed");

        if format.is_json() {
            format.payload(&serde_json::to_value(&reports)?);
            return Ok(());
        }

        if reports.is_empty() {
            format.success("No albums found");
            return Ok(());
        }
        for status in &reports {
            let headline = if status.synced_before {
                format!(
                    "{}: {} new, {} changed, {} unchanged, {} missing",
                    status.title,
                    status.new.len(),
                    status.changed.len(),
                    status.unchanged,
                    status.missing.len()
                )
            } else {
                format!("{}: never synced ({} files)", status.title, status.new.len())
            };
            format.success(&headline);
            for name in &status.new {
                format.detail(&format!("new:      {name}"));
            }
            for name in &status.changed {
                format.detail(&format!("changed:  {name}"));
            }
            for name in &status.missing {
                format.detail(&format!("missing:  {name}"));
            }
        }
        Ok(())
    }
}

/// Immediate album subdirectories, optionally narrowed to one name.
fn album_dirs(photo_dir: &Path, only: &Option<String>) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let entries = std::fs::read_dir(photo_dir)
        .with_context(|| format!("Cannot read photo directory {}", photo_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(only) = only {
            if entry.file_name().to_string_lossy() != only.as_str() {
                continue;
            }
        }
        dirs.push(entry.path());
    }
    dirs.sort();
    Ok(dirs)
}

async fn album_status(builder: &InventoryBuilder, dir: &Path) -> Result<AlbumStatus> {
    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let state = LedgerStore::load(dir).await?;
    let inventory = builder.build(dir).await?;

    let mut status = AlbumStatus {
        title: title::album_title(&dir_name).to_string(),
        synced_before: !state.is_empty(),
        ..Default::default()
    };

    let mut seen = std::collections::HashSet::new();
    for file in inventory.files() {
        let name = file
            .path
            .strip_prefix(dir)
            .unwrap_or(&file.path)
            .to_string_lossy()
            .into_owned();
        seen.insert(name.clone());

        match state.entries.values().find(|e| e.filename == name) {
            None => status.new.push(name),
            Some(entry) if entry.checksum == file.checksum => status.unchanged += 1,
            Some(_) => status.changed.push(name),
        }
    }
    for entry in state.entries.values() {
        if !seen.contains(&entry.filename) {
            status.missing.push(entry.filename.clone());
        }
    }
    status.missing.sort();

    Ok(status)
}
