// src/fetch.rs

//! Source retrieval and integrity checking.
//!
//! Transfers go through external collaborators (`curl`, `git`) invoked with
//! argv vectors, never through a shell. Downloaded archives get
//! deterministic names, `<name>-<version>-<index>.src`, so a re-run
//! overwrites its own artifact instead of littering the sources directory.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::hash::{digests_match, sha256_file};
use crate::recipe::Recipe;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Number of times curl retries transient failures
const CURL_RETRIES: &str = "3";

/// Fetches source artifacts, clones, and patches for the builder
#[derive(Debug)]
pub struct Fetcher<'a> {
    config: &'a Config,
}

impl<'a> Fetcher<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Download a URL to a destination path.
    pub fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!("curl {} -> {}", url, dest.display());
        let output = Command::new("curl")
            .arg("-L")
            .arg("--fail")
            .arg("--retry")
            .arg(CURL_RETRIES)
            .arg("-o")
            .arg(dest)
            .arg(url)
            .output()
            .map_err(|e| Error::Download {
                url: url.to_string(),
                reason: format!("failed to run curl: {}", e),
            })?;

        if !output.status.success() {
            return Err(Error::Download {
                url: url.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    /// Fetch one source archive for a recipe and verify its digest when the
    /// recipe declares one. Returns the local artifact path.
    pub fn fetch_archive(&self, recipe: &Recipe, index: usize, url: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.sources_dir)?;
        let dest = self
            .config
            .sources_dir
            .join(format!("{}-{}.src", recipe.slug(), index));

        info!("downloading {}", url);
        self.download(url, &dest)?;

        if let Some(expected) = &recipe.sha256 {
            let actual = sha256_file(&dest)?;
            if !digests_match(&actual, expected) {
                return Err(Error::ChecksumMismatch {
                    url: url.to_string(),
                    expected: expected.clone(),
                    actual,
                });
            }
            debug!("digest verified for {}", url);
        }

        Ok(dest)
    }

    /// Shallow-clone a recipe's git source, replacing any prior clone.
    /// Returns the clone directory.
    pub fn clone_git(&self, recipe: &Recipe, url: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.sources_dir)?;
        let dest = self.config.sources_dir.join(recipe.slug());
        if dest.exists() {
            fs::remove_dir_all(&dest)?;
        }

        info!("cloning {}", url);
        let output = Command::new("git")
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg(url)
            .arg(&dest)
            .output()
            .map_err(|e| Error::Download {
                url: url.to_string(),
                reason: format!("failed to run git: {}", e),
            })?;

        if !output.status.success() {
            return Err(Error::Download {
                url: url.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(dest)
    }

    /// Fetch a patch into the work tree. Failures map to the dedicated
    /// patch-fetch error so the caller exits with the right code.
    pub fn fetch_patch(&self, url: &str, dest: &Path) -> Result<()> {
        info!("downloading patch {}", url);
        self.download(url, dest)
            .map_err(|_| Error::PatchFetch(url.to_string()))
    }
}
