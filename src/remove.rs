// src/remove.rs

//! The remove engine: uninstall one package from the live root.
//!
//! Removal is blocked while any other installed package's recipe still
//! depends on the target. File digests are checked against the manifest
//! best-effort; a mismatch is logged and the file is deleted anyway, since
//! it belongs to the package regardless of local edits. Emptied parent
//! directories are not pruned.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::hash::{digests_match, sha256_file};
use crate::manifest::read_manifest;
use crate::recipe::RecipeStore;
use crate::registry::Registry;
use crate::util::now_stamp;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct RemoveEngine<'a> {
    config: &'a Config,
}

impl<'a> RemoveEngine<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Remove a package: reverse-dependency check, file deletion, registry
    /// erase, log entry.
    pub fn remove(&self, package: &str) -> Result<()> {
        let mut registry = Registry::load(self.config)?;
        let info = registry
            .get(package)
            .cloned()
            .ok_or_else(|| Error::NotInstalled(package.to_string()))?;

        self.check_reverse_deps(package, &registry)?;

        let digests = read_manifest(&info.manifest).unwrap_or_default();
        let mut removed: Vec<String> = Vec::new();

        for file in &info.files {
            let live = self.live_file(file);
            if !live.exists() {
                debug!("{} already gone", live.display());
                continue;
            }
            self.verify_digest(&live, file, &digests);
            match fs::remove_file(&live) {
                Ok(()) => removed.push(file.clone()),
                Err(e) => warn!("could not remove {}: {}", live.display(), e),
            }
        }

        registry.remove(package);
        registry.save()?;

        self.write_log(package, &info.version, &removed)?;
        info!("removed {} ({} files)", package, removed.len());
        Ok(())
    }

    /// Abort if any other installed package's recipe depends on `package`.
    fn check_reverse_deps(&self, package: &str, registry: &Registry) -> Result<()> {
        let store = RecipeStore::new(&self.config.recipes_dir);
        let deps = store.dependency_map()?;

        for (name, _) in registry.iter() {
            if name == package {
                continue;
            }
            let depends = deps.get(name).map(Vec::as_slice).unwrap_or(&[]);
            if depends.iter().any(|d| d == package) {
                return Err(Error::RequiredBy {
                    package: package.to_string(),
                    dependent: name.clone(),
                });
            }
        }
        Ok(())
    }

    fn live_file(&self, file: &str) -> PathBuf {
        self.config.root.join(file.trim_start_matches('/'))
    }

    /// Best-effort digest verification against the manifest.
    fn verify_digest(&self, live: &Path, file: &str, digests: &BTreeMap<String, String>) {
        let Some(expected) = digests.get(file) else {
            return;
        };
        match sha256_file(live) {
            Ok(actual) if digests_match(&actual, expected) => {}
            Ok(_) => warn!("{} was modified since install; removing anyway", file),
            Err(e) => debug!("could not digest {}: {}", live.display(), e),
        }
    }

    fn write_log(&self, package: &str, version: &str, removed: &[String]) -> Result<()> {
        fs::create_dir_all(&self.config.log_dir)?;
        let log = self
            .config
            .log_dir
            .join(format!("{}-remove-{}.log", now_stamp(), package));

        let mut content = format!("removed {} {}\n", package, version);
        for file in removed {
            content.push_str(file);
            content.push('\n');
        }
        fs::write(log, content)?;
        Ok(())
    }
}
