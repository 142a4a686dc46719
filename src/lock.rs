// src/lock.rs

//! Exclusive lock on the state directory.
//!
//! Only one lfsd invocation may mutate state at a time. The lock is a
//! non-blocking `flock` on `<state>/lock`; a second invocation fails fast
//! instead of corrupting the registry or racing the stage directory.

use crate::config::Config;
use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::PathBuf;
use tracing::debug;

/// Held for the lifetime of a mutating command
pub struct StateLock {
    file: File,
    path: PathBuf,
}

impl StateLock {
    /// Try to take the lock; fails immediately if another process holds it.
    pub fn acquire(config: &Config) -> Result<Self> {
        let path = config.lock_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| Error::Locked(path.clone()))?;

        debug!("state lock acquired at {}", path.display());
        Ok(Self { file, path })
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!("state lock release failed for {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_is_exclusive_and_released() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            state_dir: tmp.path().to_path_buf(),
            ..Config::default()
        };

        let lock = StateLock::acquire(&config).unwrap();
        // flock is per open file description: a second descriptor in the
        // same process still conflicts.
        assert!(matches!(
            StateLock::acquire(&config),
            Err(Error::Locked(_))
        ));

        drop(lock);
        assert!(StateLock::acquire(&config).is_ok());
    }
}
