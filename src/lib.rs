// src/lib.rs

//! lfsd - source-based package manager for a from-scratch distribution
//!
//! Reads declarative build recipes, resolves inter-package dependencies,
//! fetches and verifies upstream sources, executes staged builds into a
//! per-package prefix, records file manifests, and promotes staged trees
//! onto the live root under the protection of a pre-apply snapshot.
//!
//! # Architecture
//!
//! - Recipes: `recipe.toml` files in a mini key/value format, re-read on
//!   every command
//! - Staged builds: each package installs into its own prefix; the live
//!   root is only touched at apply time
//! - Registry: `installed.json` maps package name to version, manifest,
//!   and owned files
//! - Snapshots: zstd tarballs of the covered live subtree, the manual
//!   rollback path for a non-atomic apply

pub mod apply;
pub mod build;
pub mod config;
mod error;
pub mod fetch;
pub mod hash;
pub mod lock;
pub mod manifest;
pub mod plan;
pub mod recipe;
pub mod registry;
pub mod remove;
pub mod resolver;
pub mod snapshot;
pub mod sync;
pub mod util;

pub use apply::ApplyEngine;
pub use build::{BuildOptions, Builder};
pub use config::{ColorMode, Config};
pub use error::{BuildStep, Error, Result};
pub use fetch::Fetcher;
pub use lock::StateLock;
pub use plan::PlanStore;
pub use recipe::{Recipe, RecipeStore};
pub use registry::{InstalledInfo, Registry};
pub use remove::RemoveEngine;
pub use resolver::DepGraph;
pub use snapshot::SnapshotStore;
