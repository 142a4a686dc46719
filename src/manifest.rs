// src/manifest.rs

//! Per-package file manifests: `path<SP>sha256` lines.
//!
//! The path is the absolute live path of the installed file; the digest is
//! of the staged content at build time. Paths may contain spaces, so the
//! reader splits on the last space of each line.

use crate::error::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One manifest line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: String,
    pub sha256: String,
}

/// Write a manifest file, creating parent directories as needed.
pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = String::new();
    for entry in entries {
        content.push_str(&entry.path);
        content.push(' ');
        content.push_str(&entry.sha256);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

/// Read a manifest into a path -> digest map. Malformed lines are skipped.
pub fn read_manifest(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = fs::read_to_string(path)?;
    let mut entries = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some((file, digest)) = line.rsplit_once(' ') {
            entries.insert(file.to_string(), digest.to_string());
        }
    }
    Ok(entries)
}
