// src/snapshot.rs

//! Full-directory snapshots of the covered live subtree.
//!
//! A snapshot is a zstd-compressed tarball of `usr` under the live root,
//! created before every apply and on demand. Snapshots are opaque to the
//! rest of the system and are never deleted automatically.

use crate::build::tools;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::util::now_stamp;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Subtree of the live root covered by snapshots
pub const COVERED_SUBTREE: &str = "usr";

/// Archive suffix for snapshots and binary packages
pub const ARCHIVE_SUFFIX: &str = ".tar.zst";

/// Creates, lists, and restores snapshot archives
pub struct SnapshotStore<'a> {
    config: &'a Config,
}

impl<'a> SnapshotStore<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    fn dir(&self) -> PathBuf {
        self.config.snaps_dir()
    }

    /// Label for an automatic pre-apply snapshot
    pub fn apply_label() -> String {
        format!("apply-{}", now_stamp())
    }

    /// Label for an on-demand snapshot without an explicit name
    pub fn manual_label() -> String {
        format!("manual-{}", now_stamp())
    }

    /// Archive the covered subtree under the given label. Returns the
    /// archive path.
    pub fn create(&self, label: &str) -> Result<PathBuf> {
        let archive = self.dir().join(format!("{}{}", label, ARCHIVE_SUFFIX));
        info!("creating snapshot {}", archive.display());
        tools::archive_subtree(&self.config.root, COVERED_SUBTREE, &archive)?;
        Ok(archive)
    }

    /// Snapshot archives currently on disk, in name order.
    pub fn list(&self) -> Result<Vec<String>> {
        let dir = self.dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|n| n.ends_with(ARCHIVE_SUFFIX))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Extract a snapshot back over the live root. `name` may be the
    /// archive file name or the bare label.
    pub fn rollback(&self, name: &str) -> Result<()> {
        let archive = self.resolve(name)?;
        info!("rolling back from {}", archive.display());
        tools::unpack_zstd(&archive, &self.config.root)
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let exact = self.dir().join(name);
        if exact.is_file() {
            return Ok(exact);
        }
        let with_suffix = self.dir().join(format!("{}{}", name, ARCHIVE_SUFFIX));
        if with_suffix.is_file() {
            return Ok(with_suffix);
        }
        Err(Error::SnapshotNotFound(name.to_string()))
    }
}
