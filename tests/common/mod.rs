// tests/common/mod.rs

//! Shared helpers for the scenario tests.

// Each test binary compiles its own copy; not every binary uses every helper.
#![allow(dead_code)]

use lfsd::Config;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// A complete lfsd universe inside one temp directory: recipe tree, state,
/// stage, cache, logs, and a private live root.
pub struct TestEnv {
    // Keep the directory alive for the duration of the test
    pub tmp: TempDir,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path();

        let config = Config {
            recipes_dir: base.join("recipes"),
            state_dir: base.join("state"),
            stage_dir: base.join("stage"),
            cache_dir: base.join("cache"),
            bin_dir: base.join("cache/bin"),
            sources_dir: base.join("cache/sources"),
            log_dir: base.join("log"),
            root: base.join("root"),
            jobs: 2,
            ..Config::default()
        };
        config.ensure_dirs().unwrap();
        fs::create_dir_all(config.root.join("usr")).unwrap();

        Self { tmp, config }
    }

    /// Write a recipe file under `<recipes>/<name>/recipe.toml`.
    pub fn write_recipe(&self, name: &str, content: &str) {
        let dir = self.config.recipes_dir.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("recipe.toml"), content).unwrap();
    }

    /// A minimal sourceless recipe whose install step stages one file.
    pub fn write_leaf_recipe(&self, name: &str, version: &str, deps: &[&str]) {
        let deps = deps
            .iter()
            .map(|d| format!("\"{}\"", d))
            .collect::<Vec<_>>()
            .join(", ");
        self.write_recipe(
            name,
            &format!(
                concat!(
                    "name = \"{name}\"\n",
                    "version = \"{version}\"\n",
                    "depends = [{deps}]\n",
                    "install = [\"mkdir -p ${{STAGE}}/opt/{name}/bin && printf '{name}-{version}' > ${{STAGE}}/opt/{name}/bin/{name}\"]\n",
                ),
                name = name,
                version = version,
                deps = deps,
            ),
        );
    }
}

/// Probe for an external tool; scenario tests skip when one is missing.
pub fn have_tool(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Read a file to a string, panicking with the path on failure.
pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {}", path.display(), e))
}
