// src/sync.rs

//! Recipe repository synchronization.
//!
//! The recipe tree is a git checkout. `sync` fast-forwards an existing
//! checkout, or clones the configured remote on the configured channel
//! when the target is not one yet.

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Update or create the recipe checkout. `target` overrides the configured
/// recipes directory.
pub fn sync_recipes(config: &Config, target: Option<&Path>) -> Result<()> {
    let target = target.unwrap_or(&config.recipes_dir);

    if target.join(".git").exists() {
        info!("updating recipe checkout at {}", target.display());
        run_git(&["-C", &target.to_string_lossy(), "pull", "--ff-only"])
    } else if let Some(remote) = &config.remote_url {
        info!("cloning {} (channel {})", remote, config.channel);
        run_git(&[
            "clone",
            "--branch",
            &config.channel,
            remote,
            &config.recipes_dir.to_string_lossy(),
        ])
    } else {
        Err(Error::Config(
            "no remote configured and target is not a git checkout".to_string(),
        ))
    }
}

fn run_git(args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .args(args)
        .output()
        .map_err(|e| Error::Subprocess {
            tool: "git".to_string(),
            status: -1,
            detail: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::Subprocess {
            tool: "git".to_string(),
            status: output.status.code().unwrap_or(-1),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
