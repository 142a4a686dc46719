// src/build/mod.rs

//! The stage builder: executes one recipe end-to-end into its staged
//! prefix.
//!
//! Pipeline, strictly ordered: reset trees, fetch, unpack, patch, run the
//! recipe steps (configure, make, tests, install), manifest, pack, strip,
//! register, promote to pkgroot. Each stage has a stable failure code;
//! partial state is left on disk for diagnosis, and the reset at the top
//! makes a retry start from scratch.

pub mod tools;

use crate::config::Config;
use crate::error::{BuildStep, Error, Result};
use crate::fetch::Fetcher;
use crate::hash::sha256_file;
use crate::manifest::{write_manifest, ManifestEntry};
use crate::recipe::Recipe;
use crate::registry::{InstalledInfo, Registry};
use crate::util::now_stamp;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Name of the promoted tree inside each staged prefix
pub const PKGROOT: &str = "pkgroot";

/// Per-build switches from the command line
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    /// Strip ELF binaries in the staged prefix
    pub strip: bool,
    /// Produce a binary package under the bin directory
    pub pack: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            strip: false,
            pack: true,
        }
    }
}

/// Builds recipes into staged prefixes and records them in the registry
pub struct Builder<'a> {
    config: &'a Config,
    fetcher: Fetcher<'a>,
}

impl<'a> Builder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            fetcher: Fetcher::new(config),
        }
    }

    /// Staged prefix for a recipe
    pub fn stage_path(&self, recipe: &Recipe) -> PathBuf {
        self.config.stage_dir.join(recipe.slug())
    }

    /// Work tree for a recipe
    pub fn work_path(&self, recipe: &Recipe) -> PathBuf {
        self.config.work_dir().join(recipe.slug())
    }

    /// Run the full pipeline for one recipe.
    pub fn build(
        &self,
        recipe: &Recipe,
        registry: &mut Registry,
        options: &BuildOptions,
    ) -> Result<()> {
        info!("building {}", recipe.slug());

        let work = self.work_path(recipe);
        let stage = self.stage_path(recipe);
        reset_dir(&work)?;
        reset_dir(&stage)?;

        self.fetch_sources(recipe, &work)?;
        self.apply_patches(recipe, &work)?;
        self.run_steps(recipe, &work, &stage)?;

        let entries = self.write_stage_manifest(recipe, &stage)?;

        if options.pack {
            let archive = self.config.bin_dir.join(format!("{}.tar.zst", recipe.slug()));
            info!("packing {}", archive.display());
            tools::pack_zstd(&stage, &archive)?;
        }

        if options.strip {
            self.strip_binaries(&stage, &entries);
        }

        registry.insert(
            recipe.name.clone(),
            InstalledInfo {
                version: recipe.version.clone(),
                installed_at: now_stamp(),
                manifest: self.manifest_path(recipe),
                files: entries.iter().map(|e| e.path.clone()).collect(),
                source_hash: String::new(),
            },
        );
        registry.save()?;

        self.promote(&stage)?;
        info!("built {}", recipe.slug());
        Ok(())
    }

    /// Step 2: populate the work tree from git or archives.
    fn fetch_sources(&self, recipe: &Recipe, work: &Path) -> Result<()> {
        if let Some(git_url) = &recipe.git {
            let clone = self.fetcher.clone_git(recipe, git_url)?;
            tools::mirror_tree(&clone, work)?;
        } else {
            for (index, url) in recipe.sources.iter().enumerate() {
                let archive = self.fetcher.fetch_archive(recipe, index, url)?;
                tools::extract_stripped(&archive, work)?;
            }
        }
        Ok(())
    }

    /// Step 3: fetch and apply patches in recipe order.
    fn apply_patches(&self, recipe: &Recipe, work: &Path) -> Result<()> {
        for (index, url) in recipe.patches.iter().enumerate() {
            let patch = work.join(format!("patch-{}.diff", index));
            self.fetcher.fetch_patch(url, &patch)?;
            info!("applying patch {}", url);
            tools::apply_patch(work, &patch)?;
        }
        Ok(())
    }

    /// Steps 4-5: substitute and run the recipe's command sequences.
    fn run_steps(&self, recipe: &Recipe, work: &Path, stage: &Path) -> Result<()> {
        let steps = [
            (BuildStep::Configure, &recipe.configure),
            (BuildStep::Make, &recipe.make),
            (BuildStep::Tests, &recipe.tests),
            (BuildStep::Install, &recipe.install),
        ];

        for (step, commands) in steps {
            for template in commands {
                let command = substitute(template, stage, self.config.jobs);
                info!("[{}] {}", step, command);
                self.run_shell(step, &command, work, stage)?;
            }
        }
        Ok(())
    }

    /// Run one recipe command through the system shell inside `work`.
    fn run_shell(&self, step: BuildStep, command: &str, work: &Path, stage: &Path) -> Result<()> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(work)
            .env("STAGE", stage)
            .env("JOBS", self.config.jobs.to_string())
            .status()
            .map_err(|e| Error::Subprocess {
                tool: "sh".to_string(),
                status: -1,
                detail: e.to_string(),
            })?;

        if !status.success() {
            return Err(Error::StepFailed {
                step,
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }

    fn manifest_path(&self, recipe: &Recipe) -> PathBuf {
        self.config
            .manifests_dir()
            .join(format!("{}.manifest", recipe.slug()))
    }

    /// Step 6: digest every staged file and write the manifest. Entry paths
    /// are live absolute paths (the stage prefix stripped).
    fn write_stage_manifest(&self, recipe: &Recipe, stage: &Path) -> Result<Vec<ManifestEntry>> {
        let mut entries = Vec::new();
        for file in collect_regular_files(stage) {
            let digest = sha256_file(&file)?;
            let live = live_path(stage, &file)?;
            entries.push(ManifestEntry {
                path: live,
                sha256: digest,
            });
        }

        let path = self.manifest_path(recipe);
        write_manifest(&path, &entries)?;
        debug!("manifest {} ({} files)", path.display(), entries.len());
        Ok(entries)
    }

    /// Step 8: strip ELF binaries under bin/sbin/lib paths. Best-effort;
    /// a file that will not strip is left as is.
    fn strip_binaries(&self, stage: &Path, entries: &[ManifestEntry]) {
        for entry in entries {
            if !is_strip_candidate(&entry.path) {
                continue;
            }
            let staged = stage.join(entry.path.trim_start_matches('/'));
            if !tools::is_elf(&staged) {
                continue;
            }
            if let Err(e) = tools::strip_file(&staged) {
                debug!("strip skipped for {}: {}", staged.display(), e);
            }
        }
    }

    /// Step 10: promote the staged tree into `<stage>/pkgroot` for the
    /// apply engine.
    fn promote(&self, stage: &Path) -> Result<()> {
        let pkgroot = stage.join(PKGROOT);
        reset_dir(&pkgroot)?;

        for entry in fs::read_dir(stage)? {
            let entry = entry?;
            if entry.file_name() == PKGROOT {
                continue;
            }
            let dest = pkgroot.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                tools::mirror_tree(&entry.path(), &dest)?;
            } else {
                fs::copy(entry.path(), &dest)?;
            }
        }
        Ok(())
    }
}

/// Replace `${STAGE}` and `${JOBS}` in a command template.
pub fn substitute(template: &str, stage: &Path, jobs: usize) -> String {
    template
        .replace("${STAGE}", &stage.to_string_lossy())
        .replace("${JOBS}", &jobs.to_string())
}

/// Remove a directory tree if present and recreate it empty.
fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// All regular files under a directory, sorted by path.
fn collect_regular_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

/// Map a staged file onto its live absolute path.
fn live_path(stage: &Path, file: &Path) -> Result<String> {
    let rel = file.strip_prefix(stage).map_err(|_| {
        Error::Registry(format!(
            "{} is outside the staged prefix {}",
            file.display(),
            stage.display()
        ))
    })?;
    Ok(Path::new("/").join(rel).to_string_lossy().into_owned())
}

/// Whether a live path is in a directory the stripper covers.
fn is_strip_candidate(path: &str) -> bool {
    path.contains("/bin/") || path.contains("/sbin/") || path.contains("/lib/")
}
