// src/registry.rs

//! The installed-package registry, persisted as `installed.json`.
//!
//! One entry per package name. The file is rewritten wholesale on every
//! save through a temp-file rename, so a crash mid-write never leaves a
//! truncated registry behind.
//!
//! The writer emits strictly valid JSON. The reader additionally accepts
//! the trailing-comma form produced by earlier releases; a string-aware
//! pre-pass strips the stray commas before serde sees the document.

use crate::config::Config;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Persistent record of one installed package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledInfo {
    pub version: String,
    /// Install timestamp, `YYYYMMDD-HHMMSS`
    #[serde(default)]
    pub installed_at: String,
    /// Path of the file-digest manifest
    #[serde(default)]
    pub manifest: PathBuf,
    /// Absolute live paths installed by the package, in manifest order
    #[serde(default)]
    pub files: Vec<String>,
    /// Reserved; may be empty
    #[serde(default)]
    pub source_hash: String,
}

/// In-memory view of `installed.json`
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    packages: BTreeMap<String, InstalledInfo>,
}

impl Registry {
    /// Load the registry, or an empty one if the file does not exist yet.
    pub fn load(config: &Config) -> Result<Self> {
        Self::open(config.registry_path())
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let packages = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let cleaned = strip_trailing_commas(&content);
            serde_json::from_str(&cleaned)
                .map_err(|e| Error::Registry(format!("{}: {}", path.display(), e)))?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, packages })
    }

    /// Rewrite the registry file with the current contents.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.packages)
            .map_err(|e| Error::Registry(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json + "\n")?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&InstalledInfo> {
        self.packages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Insert or replace the entry for a package.
    pub fn insert(&mut self, name: String, info: InstalledInfo) {
        self.packages.insert(name, info);
    }

    pub fn remove(&mut self, name: &str) -> Option<InstalledInfo> {
        self.packages.remove(name)
    }

    /// Iterate entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &InstalledInfo)> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Remove commas that directly precede a closing brace or bracket, outside
/// of string literals. Valid JSON is passed through unchanged.
fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    // Candidate trailing comma, plus any whitespace seen after it
    let mut pending = String::new();

    for c in input.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            ',' => {
                out.push_str(&pending);
                pending.clear();
                pending.push(',');
            }
            c if c.is_whitespace() && !pending.is_empty() => pending.push(c),
            '}' | ']' if !pending.is_empty() => {
                // Drop the comma, keep the whitespace that followed it
                out.push_str(&pending[1..]);
                pending.clear();
                out.push(c);
            }
            _ => {
                out.push_str(&pending);
                pending.clear();
                if c == '"' {
                    in_string = true;
                }
                out.push(c);
            }
        }
    }
    out.push_str(&pending);
    out
}
