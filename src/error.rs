// src/error.rs

//! Crate-wide error type and the exit-code mapping for the CLI.
//!
//! Every operational failure is a variant here; the process exit code is
//! derived from the variant so that callers and scripts can distinguish
//! the failing stage (fetch vs. digest vs. a recipe build step).

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// A recipe build step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Configure,
    Make,
    Tests,
    Install,
}

impl BuildStep {
    /// Step name as it appears in recipes and diagnostics
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Make => "make",
            Self::Tests => "tests",
            Self::Install => "install",
        }
    }

    /// Process exit code reported when this step fails
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Configure => 10,
            Self::Make => 11,
            Self::Tests => 12,
            Self::Install => 13,
        }
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// All operational errors surfaced by lfsd
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("recipe for {0} not found")]
    RecipeNotFound(String),

    #[error("package {0} is not installed")]
    NotInstalled(String),

    #[error("no plan; run plan first")]
    NoPlan,

    #[error("cycle detected in dependency graph: {0}")]
    DependencyCycle(String),

    #[error("download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("SHA256 mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("patch fetch failed for {0}")]
    PatchFetch(String),

    #[error("{step} step failed with status {status}")]
    StepFailed { step: BuildStep, status: i32 },

    #[error("package {dependent} depends on {package}; remove aborted")]
    RequiredBy { package: String, dependent: String },

    #[error("snapshot {0} not found")]
    SnapshotNotFound(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("apply failed: {0}")]
    Apply(String),

    #[error("{tool} failed with status {status}: {detail}")]
    Subprocess {
        tool: String,
        status: i32,
        detail: String,
    },

    #[error("another lfsd instance holds the state lock at {}", .0.display())]
    Locked(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map this error onto the documented process exit codes.
    ///
    /// 1 usage / missing target, 2 reverse-dependency or fetch, 3 digest
    /// mismatch, 4 patch fetch, 10-13 configure/make/tests/install.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RequiredBy { .. } | Self::Download { .. } => 2,
            Self::ChecksumMismatch { .. } => 3,
            Self::PatchFetch(_) => 4,
            Self::StepFailed { step, .. } => step.exit_code(),
            _ => 1,
        }
    }
}
