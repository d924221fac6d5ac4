//! Advisory cross-process lock around the cache's read-modify-write cycle.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use super::store::CacheError;

/// Handle on the companion lock file. Holding a [`CacheLockGuard`] excludes
/// other processes that go through the same lock file; readers that ignore
/// it are unaffected.
#[derive(Debug, Clone)]
pub struct CacheLock {
    path: PathBuf,
}

impl CacheLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the lock file if it does not exist yet.
    pub fn ensure_exists(&self) -> Result<(), CacheError> {
        self.open()?;
        Ok(())
    }

    /// Block until the exclusive lock is held.
    pub fn acquire(&self) -> Result<CacheLockGuard, CacheError> {
        let file = self.open()?;
        FileExt::lock_exclusive(&file).map_err(|source| CacheError::Lock {
            path: self.path.clone(),
            source,
        })?;
        Ok(CacheLockGuard {
            file,
            path: self.path.clone(),
            held: true,
        })
    }

    fn open(&self) -> Result<File, CacheError> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)
            .map_err(|source| CacheError::Lock {
                path: self.path.clone(),
                source,
            })
    }
}

/// A held lock. Released by [`CacheLockGuard::release`], or on drop if the
/// holder exits early.
#[derive(Debug)]
pub struct CacheLockGuard {
    file: File,
    path: PathBuf,
    held: bool,
}

impl CacheLockGuard {
    pub fn release(mut self) -> Result<(), CacheError> {
        self.unlock()
    }

    fn unlock(&mut self) -> Result<(), CacheError> {
        if !self.held {
            return Ok(());
        }
        self.held = false;
        FileExt::unlock(&self.file).map_err(|source| CacheError::Lock {
            path: self.path.clone(),
            source,
        })
    }
}

impl Drop for CacheLockGuard {
    fn drop(&mut self) {
        if let Err(err) = self.unlock() {
            tracing::warn!(error = %err, "failed to release cache lock");
        }
    }
}
