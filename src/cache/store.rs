use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cache::entry::{CacheData, CacheEntry};
use crate::cache::lock::{CacheLock, CacheLockGuard};
use crate::config::CacheConfig;
use crate::types::identifiers::EntityId;

pub const CACHE_FILE_NAME: &str = "search_cache.json";
pub const LOCK_FILE_NAME: &str = "search_cache.lock";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Lock error on {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug)]
struct CacheFiles {
    live: PathBuf,
    tmp: PathBuf,
    backup: PathBuf,
    lock: CacheLock,
}

impl CacheFiles {
    fn in_dir(dir: &Path) -> Self {
        let live = dir.join(CACHE_FILE_NAME);
        Self {
            tmp: live.with_extension("json.tmp"),
            backup: live.with_extension("json.bak"),
            live,
            lock: CacheLock::new(dir.join(LOCK_FILE_NAME)),
        }
    }
}

/// File-backed lookup cache with per-entity sliding expiry.
///
/// Every mutation is persisted before returning: the whole map is written to a
/// sibling `.tmp` file and renamed over the live file, so readers never see a
/// partial write. I/O failures are logged and swallowed; the in-memory map stays
/// authoritative for the rest of the process.
///
/// A disabled cache never touches the filesystem: `get` misses, `put` stores
/// nothing, `get_all` is empty.
#[derive(Debug)]
pub struct TtlCache<C = SystemClock> {
    files: Option<CacheFiles>,
    ttl: Duration,
    data: CacheData,
    clock: C,
}

impl TtlCache<SystemClock> {
    pub fn open(config: &CacheConfig) -> Result<Self, CacheError> {
        Self::open_with_clock(config, SystemClock)
    }

    pub fn disabled() -> Self {
        Self::disabled_with_clock(SystemClock)
    }
}

impl<C: Clock> TtlCache<C> {
    /// Open (or create) the cache in `config.dir` and drop every stale entry
    /// before serving anything. Only directory or lock-file creation can fail;
    /// an unreadable cache file starts an empty cache.
    pub fn open_with_clock(config: &CacheConfig, clock: C) -> Result<Self, CacheError> {
        if !config.enabled {
            return Ok(Self::disabled_with_clock(clock));
        }

        fs::create_dir_all(&config.dir)?;
        let files = CacheFiles::in_dir(&config.dir);
        files.lock.ensure_exists()?;

        let data = match load_file(&files.live) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(
                    path = %files.live.display(),
                    error = %err,
                    "Failed to load cache file, starting with empty cache"
                );
                CacheData::new()
            }
        };

        let mut cache = Self {
            files: Some(files),
            ttl: Duration::from_secs(config.ttl_hours.saturating_mul(3600)),
            data,
            clock,
        };

        let removed = cache.sweep_expired();
        if removed > 0 {
            tracing::info!("Cleaned up {removed} expired cache entries");
            cache.persist();
        }

        Ok(cache)
    }

    pub fn disabled_with_clock(clock: C) -> Self {
        Self {
            files: None,
            ttl: Duration::ZERO,
            data: CacheData::new(),
            clock,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.files.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.files.as_ref().map(|f| f.live.as_path())
    }

    pub fn lock_path(&self) -> Option<&Path> {
        self.files.as_ref().map(|f| f.lock.path())
    }

    /// Number of entities currently held, fresh or not.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cached result for `query` under `entity`. A stale entry is removed (and
    /// the removal persisted) before reporting the miss.
    pub fn get(&mut self, entity: &str, query: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        let key = EntityId::new(entity)?;

        let now = self.clock.now();
        let fresh = self.data.get(&key)?.is_fresh(now, self.ttl);
        if !fresh {
            tracing::debug!(entity = %key, "cache entry expired");
            self.data.remove(&key);
            self.persist();
            return None;
        }

        self.data
            .get(&key)
            .and_then(|entry| entry.searches.get(query).cloned())
    }

    /// Store `result` for `query` and restart the entity's expiry window.
    /// A stale entry is replaced rather than revived.
    pub fn put(&mut self, entity: &str, query: &str, result: &str) {
        if !self.is_enabled() {
            return;
        }
        let Some(key) = EntityId::new(entity) else {
            return;
        };

        let now = self.clock.now();
        let ttl = self.ttl;
        let entry = self
            .data
            .entry(key)
            .and_modify(|entry| {
                if !entry.is_fresh(now, ttl) {
                    *entry = CacheEntry::new(now);
                }
            })
            .or_insert_with(|| CacheEntry::new(now));
        entry.touch(now);
        entry.searches.insert(query.to_string(), result.to_string());

        self.persist();
    }

    /// Snapshot of every cached query for `entity`, empty when absent or stale.
    pub fn get_all(&self, entity: &str) -> BTreeMap<String, String> {
        if !self.is_enabled() {
            return BTreeMap::new();
        }
        let Some(key) = EntityId::new(entity) else {
            return BTreeMap::new();
        };

        match self.data.get(&key) {
            Some(entry) if entry.is_fresh(self.clock.now(), self.ttl) => entry.searches.clone(),
            _ => BTreeMap::new(),
        }
    }

    /// Remove an entity outright. Returns whether anything was removed.
    pub fn evict(&mut self, entity: &str) -> bool {
        let Some(key) = EntityId::new(entity) else {
            return false;
        };
        let removed = self.data.remove(&key).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    /// Drop stale entries from memory. Does not persist.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let before = self.data.len();
        self.data.retain(|_, entry| entry.is_fresh(now, ttl));
        before - self.data.len()
    }

    /// Acquire the cross-process lock directly. Prefer [`TtlCache::with_lock`].
    pub fn lock(&self) -> Result<Option<CacheLockGuard>, CacheError> {
        self.files
            .as_ref()
            .map(|files| files.lock.acquire())
            .transpose()
    }

    /// Run `f` while holding the cross-process lock.
    ///
    /// Entries written by other processes are merged in first so their updates
    /// are not lost when `f` persists. The lock is released on every exit path.
    /// If the lock cannot be taken, `f` still runs unlocked.
    pub fn with_lock<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let guard = match self.lock() {
            Ok(guard) => guard,
            Err(err) => {
                tracing::warn!(error = %err, "cache lock unavailable, continuing unlocked");
                None
            }
        };

        if guard.is_some() {
            self.merge_from_disk();
        }

        let out = f(self);

        if let Some(guard) = guard {
            if let Err(err) = guard.release() {
                tracing::warn!(error = %err, "failed to release cache lock");
            }
        }
        out
    }

    /// Fold the persisted file into memory. Stale entries on either side are
    /// dropped first; only two fresh entries have their queries unioned. Memory
    /// wins on conflicting queries unless the file's entry is newer.
    fn merge_from_disk(&mut self) {
        let Some(files) = &self.files else {
            return;
        };
        let on_disk = match load_file(&files.live) {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!(error = %err, "skipping merge of unreadable cache file");
                return;
            }
        };

        let now = self.clock.now();
        let ttl = self.ttl;
        self.data.retain(|_, entry| entry.is_fresh(now, ttl));

        for (key, disk_entry) in on_disk {
            if !disk_entry.is_fresh(now, ttl) {
                continue;
            }
            match self.data.get_mut(&key) {
                None => {
                    self.data.insert(key, disk_entry);
                }
                Some(mem_entry) => {
                    if disk_entry.freshness() > mem_entry.freshness() {
                        let mut merged = disk_entry;
                        for (query, result) in std::mem::take(&mut mem_entry.searches) {
                            merged.searches.entry(query).or_insert(result);
                        }
                        *mem_entry = merged;
                    } else {
                        for (query, result) in disk_entry.searches {
                            mem_entry.searches.entry(query).or_insert(result);
                        }
                    }
                }
            }
        }
    }

    fn persist(&self) {
        let Some(files) = &self.files else {
            return;
        };
        if let Err(err) = write_atomically(files, &self.data) {
            tracing::warn!(path = %files.live.display(), error = %err, "Failed to save cache file");
            let _ = fs::remove_file(&files.tmp);
        }
    }
}

fn load_file(path: &Path) -> Result<CacheData, CacheError> {
    if !path.exists() {
        return Ok(CacheData::new());
    }
    let f = File::open(path)?;
    let data = serde_json::from_reader(std::io::BufReader::new(f))?;
    Ok(data)
}

fn write_atomically(files: &CacheFiles, data: &CacheData) -> Result<(), CacheError> {
    // 1. Best-effort backup of the current live file
    if files.live.exists() {
        if let Err(err) = fs::copy(&files.live, &files.backup) {
            tracing::debug!(error = %err, "cache backup failed");
        }
    }

    // 2. Write the full map to the temp file
    let f = File::create(&files.tmp)?;
    serde_json::to_writer_pretty(&f, data)?;
    f.sync_all()?;

    // 3. Atomic rename
    fs::rename(&files.tmp, &files.live)?;

    // 4. Backup is no longer needed
    if files.backup.exists() {
        if let Err(err) = fs::remove_file(&files.backup) {
            tracing::debug!(error = %err, "failed to remove cache backup");
        }
    }
    Ok(())
}
