// src/config.rs

//! Runtime configuration assembled from `LFSD_*` environment variables.
//!
//! Every path the tool touches is resolved once, up front, into an explicit
//! `Config` that is threaded through the component constructors. There is
//! no global mutable state.

use crate::error::Result;
use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;

/// Colour mode for terminal output (`LFSD_COLOR`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    Always,
    Never,
    #[default]
    Auto,
}

impl ColorMode {
    /// Parse `always|never|auto`; anything else falls back to auto.
    pub fn parse(s: &str) -> Self {
        match s {
            "always" => Self::Always,
            "never" => Self::Never,
            _ => Self::Auto,
        }
    }

    /// Whether ANSI colour should be emitted on stdout
    pub fn enabled(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::stdout().is_terminal(),
        }
    }
}

/// Resolved configuration for one invocation
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the recipe tree (`recipe.toml` files underneath)
    pub recipes_dir: PathBuf,
    /// Persistent state: registry, manifests, pending plan
    pub state_dir: PathBuf,
    /// Per-package staged prefixes
    pub stage_dir: PathBuf,
    /// Cache root: snapshots and work trees live underneath
    pub cache_dir: PathBuf,
    /// Binary package output directory
    pub bin_dir: PathBuf,
    /// Downloaded source artifacts and git clones
    pub sources_dir: PathBuf,
    /// Remove logs
    pub log_dir: PathBuf,
    /// Remote recipe repository, if configured
    pub remote_url: Option<String>,
    /// Branch of the recipe repository to follow
    pub channel: String,
    /// Snapshot backend selector (only `tar` is implemented)
    pub snapshot_backend: String,
    pub color: ColorMode,
    /// Parallelism handed to recipe steps via `${JOBS}`
    pub jobs: usize,
    /// Live root the apply/remove/rollback engines operate on
    pub root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);

        Self {
            recipes_dir: PathBuf::from("/usr/share/lfsd/recipes"),
            state_dir: PathBuf::from("/var/lib/lfsd"),
            stage_dir: PathBuf::from("/var/stage/lfsd"),
            cache_dir: PathBuf::from("/var/cache/lfsd"),
            bin_dir: PathBuf::from("/var/cache/lfsd/bin"),
            sources_dir: PathBuf::from("/var/cache/lfsd/sources"),
            log_dir: PathBuf::from("/var/log/lfsd"),
            remote_url: None,
            channel: "stable".to_string(),
            snapshot_backend: "tar".to_string(),
            color: ColorMode::Auto,
            jobs,
            root: PathBuf::from("/"),
        }
    }
}

impl Config {
    /// Build a configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// `from_env` is a thin wrapper; tests inject their own lookup instead
    /// of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("LFSD_RECIPES_DIR") {
            config.recipes_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LFSD_STATE_DIR") {
            config.state_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LFSD_STAGE_DIR") {
            config.stage_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LFSD_CACHE_DIR") {
            config.cache_dir = PathBuf::from(&v);
            config.bin_dir = config.cache_dir.join("bin");
            config.sources_dir = config.cache_dir.join("sources");
        }
        if let Some(v) = lookup("LFSD_BIN") {
            config.bin_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LFSD_SOURCES") {
            config.sources_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LFSD_LOG_DIR") {
            config.log_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LFSD_REMOTE_URL") {
            if !v.is_empty() {
                config.remote_url = Some(v);
            }
        }
        if let Some(v) = lookup("LFSD_CHANNEL") {
            config.channel = v;
        }
        if let Some(v) = lookup("LFSD_SNAPSHOT_BACKEND") {
            config.snapshot_backend = v;
        }
        if let Some(v) = lookup("LFSD_COLOR") {
            config.color = ColorMode::parse(&v);
        }
        if let Some(v) = lookup("LFSD_JOBS") {
            if let Ok(jobs) = v.parse::<usize>() {
                if jobs > 0 {
                    config.jobs = jobs;
                }
            }
        }

        config
    }

    /// Create every directory the tool relies on.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            &self.recipes_dir,
            &self.state_dir,
            &self.stage_dir,
            &self.cache_dir,
            &self.bin_dir,
            &self.sources_dir,
            &self.log_dir,
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Path of the installed-package registry
    pub fn registry_path(&self) -> PathBuf {
        self.state_dir.join("installed.json")
    }

    /// Directory holding per-package file manifests
    pub fn manifests_dir(&self) -> PathBuf {
        self.state_dir.join("manifests")
    }

    /// Path of the pending build plan
    pub fn plan_path(&self) -> PathBuf {
        self.state_dir.join("pending.plan")
    }

    /// Directory holding snapshot archives
    pub fn snaps_dir(&self) -> PathBuf {
        self.cache_dir.join("snaps")
    }

    /// Root for per-package work trees
    pub fn work_dir(&self) -> PathBuf {
        self.cache_dir.join("work")
    }

    /// Path of the state-directory lock file
    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.join("lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.recipes_dir, PathBuf::from("/usr/share/lfsd/recipes"));
        assert_eq!(config.registry_path(), PathBuf::from("/var/lib/lfsd/installed.json"));
        assert_eq!(config.plan_path(), PathBuf::from("/var/lib/lfsd/pending.plan"));
        assert_eq!(config.snaps_dir(), PathBuf::from("/var/cache/lfsd/snaps"));
        assert_eq!(config.root, PathBuf::from("/"));
        assert_eq!(config.channel, "stable");
        assert!(config.remote_url.is_none());
        assert!(config.jobs > 0);
    }

    #[test]
    fn test_env_overrides() {
        let mut env = HashMap::new();
        env.insert("LFSD_RECIPES_DIR", "/tmp/recipes");
        env.insert("LFSD_STATE_DIR", "/tmp/state");
        env.insert("LFSD_REMOTE_URL", "https://example.com/recipes.git");
        env.insert("LFSD_CHANNEL", "testing");
        env.insert("LFSD_JOBS", "7");
        env.insert("LFSD_COLOR", "never");

        let config = Config::from_lookup(lookup_from(&env));
        assert_eq!(config.recipes_dir, PathBuf::from("/tmp/recipes"));
        assert_eq!(config.state_dir, PathBuf::from("/tmp/state"));
        assert_eq!(config.remote_url.as_deref(), Some("https://example.com/recipes.git"));
        assert_eq!(config.channel, "testing");
        assert_eq!(config.jobs, 7);
        assert_eq!(config.color, ColorMode::Never);
    }

    #[test]
    fn test_cache_dir_moves_bin_and_sources() {
        let mut env = HashMap::new();
        env.insert("LFSD_CACHE_DIR", "/tmp/cache");

        let config = Config::from_lookup(lookup_from(&env));
        assert_eq!(config.bin_dir, PathBuf::from("/tmp/cache/bin"));
        assert_eq!(config.sources_dir, PathBuf::from("/tmp/cache/sources"));
        assert_eq!(config.work_dir(), PathBuf::from("/tmp/cache/work"));
    }

    #[test]
    fn test_explicit_bin_wins_over_cache() {
        let mut env = HashMap::new();
        env.insert("LFSD_CACHE_DIR", "/tmp/cache");
        env.insert("LFSD_BIN", "/tmp/elsewhere/bin");

        let config = Config::from_lookup(lookup_from(&env));
        assert_eq!(config.bin_dir, PathBuf::from("/tmp/elsewhere/bin"));
    }

    #[test]
    fn test_invalid_jobs_keeps_default() {
        let default_jobs = Config::default().jobs;

        let mut env = HashMap::new();
        env.insert("LFSD_JOBS", "zero");
        let config = Config::from_lookup(lookup_from(&env));
        assert_eq!(config.jobs, default_jobs);

        let mut env = HashMap::new();
        env.insert("LFSD_JOBS", "0");
        let config = Config::from_lookup(lookup_from(&env));
        assert_eq!(config.jobs, default_jobs);
    }

    #[test]
    fn test_color_parse() {
        assert_eq!(ColorMode::parse("always"), ColorMode::Always);
        assert_eq!(ColorMode::parse("never"), ColorMode::Never);
        assert_eq!(ColorMode::parse("auto"), ColorMode::Auto);
        assert_eq!(ColorMode::parse("garbage"), ColorMode::Auto);
        assert!(ColorMode::Always.enabled());
        assert!(!ColorMode::Never.enabled());
    }
}
