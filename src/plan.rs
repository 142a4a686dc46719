// src/plan.rs

//! The pending build plan, persisted between `plan` and `build`.
//!
//! A plan is a newline-separated list of package names in topological
//! order. It is written only after a successful sort, so a cycle never
//! leaves a plan file behind.

use crate::config::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::PathBuf;

/// Reads and writes `<state>/pending.plan`
#[derive(Debug)]
pub struct PlanStore {
    path: PathBuf,
}

impl PlanStore {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.plan_path(),
        }
    }

    /// Persist a build order, one name per line.
    pub fn write(&self, order: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut content = order.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Read the stored order; fails with `NoPlan` when none exists.
    pub fn read(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Err(Error::NoPlan);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}
