// src/apply.rs

//! The apply engine: promote every staged pkgroot onto the live root.
//!
//! A snapshot of the covered subtree is taken before any mutation; if the
//! snapshot cannot be created the apply does not start, since it is the
//! only rollback path. The mirror itself is not atomic across packages and
//! the order between pkgroots is unspecified.

use crate::build::{tools, PKGROOT};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::snapshot::SnapshotStore;
use std::fs;
use tracing::{info, warn};

pub struct ApplyEngine<'a> {
    config: &'a Config,
}

impl<'a> ApplyEngine<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Snapshot, then mirror all staged pkgroots onto the live root.
    ///
    /// Every pkgroot is attempted even if an earlier one fails; failures
    /// are collected and reported together.
    pub fn apply(&self) -> Result<()> {
        let snapshots = SnapshotStore::new(self.config);
        let snapshot = snapshots.create(&SnapshotStore::apply_label())?;
        info!("pre-apply snapshot at {}", snapshot.display());

        let mut applied = 0usize;
        let mut failed: Vec<String> = Vec::new();

        for entry in fs::read_dir(&self.config.stage_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let pkgroot = entry.path().join(PKGROOT);
            if !pkgroot.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            info!("applying {}", name);
            match tools::rsync_mirror(&pkgroot, &self.config.root) {
                Ok(()) => applied += 1,
                Err(e) => {
                    warn!("mirror failed for {}: {}", name, e);
                    failed.push(name);
                }
            }
        }

        if !failed.is_empty() {
            return Err(Error::Apply(format!(
                "mirror failed for: {}",
                failed.join(", ")
            )));
        }

        info!("applied {} staged package(s)", applied);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command;

    fn have(tool: &str) -> bool {
        Command::new(tool)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn config_in(dir: &Path) -> Config {
        Config {
            stage_dir: dir.join("stage"),
            cache_dir: dir.join("cache"),
            root: dir.join("root"),
            ..Config::default()
        }
    }

    #[test]
    fn test_apply_mirrors_pkgroots() {
        if !have("tar") || !have("rsync") || !have("zstd") {
            eprintln!("skipping: tar/rsync/zstd not all available");
            return;
        }

        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(tmp.path());

        // Covered subtree must exist for the pre-apply snapshot
        fs::create_dir_all(config.root.join("usr")).unwrap();

        let pkgroot = config.stage_dir.join("hello-1.0").join(PKGROOT);
        fs::create_dir_all(pkgroot.join("opt/hello/bin")).unwrap();
        fs::write(pkgroot.join("opt/hello/bin/hello"), b"#!/bin/sh\n").unwrap();

        // A staged dir without a pkgroot must be ignored
        fs::create_dir_all(config.stage_dir.join("halfway-2.0")).unwrap();

        ApplyEngine::new(&config).apply().unwrap();

        assert!(config.root.join("opt/hello/bin/hello").exists());
        // Snapshot was taken
        let snaps = SnapshotStore::new(&config).list().unwrap();
        assert_eq!(snaps.len(), 1);
        assert!(snaps[0].starts_with("apply-"));
    }

    #[test]
    fn test_apply_fails_without_snapshot() {
        if !have("tar") {
            eprintln!("skipping: tar not available");
            return;
        }

        let tmp = tempfile::tempdir().unwrap();
        let config = config_in(tmp.path());
        fs::create_dir_all(&config.stage_dir).unwrap();
        // No root/usr: the snapshot tar fails, and apply must not proceed.
        fs::create_dir_all(&config.root).unwrap();

        assert!(ApplyEngine::new(&config).apply().is_err());
    }
}
