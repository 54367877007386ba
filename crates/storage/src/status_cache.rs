// SPDX-License-Identifier: MIT

//! Status cache: cached `lpq`-style replies (spec §4.9 "Status cache").
//!
//! Cache key is a hash of the printer name, display format, and argument
//! tokens. A cache entry records the slot file plus the mtimes of the
//! source `status`/`control` files captured at generation time; a lookup
//! only hits if both mtimes are unchanged and the entry isn't stale. The
//! index file is protected by an advisory lock (spec §4.9 last sentence),
//! grounded on the same `fs2` locking idiom as the queue `lock` file.

use crate::atomic::write_atomic;
use crate::error::StorageError;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// What a status-cache lookup is keyed on.
#[derive(Debug, Clone, Hash)]
pub struct StatusCacheKey {
    pub printer: String,
    pub format: char,
    pub args: Vec<String>,
}

impl StatusCacheKey {
    fn hash_value(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    key_hash: u64,
    slot: u32,
    status_mtime: u64,
    control_mtime: u64,
    generated_at: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CacheIndex {
    entries: Vec<CacheEntry>,
    next_slot: u32,
}

fn system_time_to_epoch(t: SystemTime) -> u64 {
    t.duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Manages the `Lpq_status_cached` slots and their index for one queue.
pub struct StatusCache {
    cache_dir: PathBuf,
    max_slots: u32,
}

impl StatusCache {
    pub fn new(cache_dir: impl Into<PathBuf>, max_slots: u32) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            max_slots,
        }
    }

    fn index_path(&self) -> PathBuf {
        self.cache_dir.join("index")
    }

    fn index_lock_path(&self) -> PathBuf {
        self.cache_dir.join("index.lock")
    }

    fn slot_path(&self, slot: u32) -> PathBuf {
        self.cache_dir.join(format!("lpq.status.{slot}"))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| StorageError::io(&self.cache_dir, e))
    }

    fn load_index(&self) -> Result<CacheIndex, StorageError> {
        match std::fs::read_to_string(self.index_path()) {
            Ok(text) => Ok(serde_json::from_str(&text).unwrap_or_default()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CacheIndex::default()),
            Err(e) => Err(StorageError::io(self.index_path(), e)),
        }
    }

    fn save_index(&self, index: &CacheIndex) -> Result<(), StorageError> {
        let json = serde_json::to_vec(index).unwrap_or_default();
        write_atomic(&self.index_path(), &json)
    }

    /// Run `f` with the index file locked exclusively, guarding the
    /// read-modify-write of the cache index (spec §4.9: "The index file is
    /// protected by an advisory lock").
    fn with_index_lock<R>(&self, f: impl FnOnce(&Self) -> Result<R, StorageError>) -> Result<R, StorageError> {
        self.ensure_dir()?;
        let lock_path = self.index_lock_path();
        let lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| StorageError::io(&lock_path, e))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StorageError::io(&lock_path, e))?;
        let result = f(self);
        let _ = lock_file.unlock();
        result
    }

    /// Look up a cached reply. Returns the slot path if the entry's source
    /// mtimes match and it is younger than `max_age`.
    pub fn lookup(
        &self,
        key: &StatusCacheKey,
        status_mtime: SystemTime,
        control_mtime: SystemTime,
        max_age: Duration,
        now: SystemTime,
    ) -> Result<Option<PathBuf>, StorageError> {
        self.with_index_lock(|this| {
            let index = this.load_index()?;
            let key_hash = key.hash_value();
            let status_mtime = system_time_to_epoch(status_mtime);
            let control_mtime = system_time_to_epoch(control_mtime);
            let now = system_time_to_epoch(now);

            let hit = index.entries.iter().find(|e| {
                e.key_hash == key_hash
                    && e.status_mtime == status_mtime
                    && e.control_mtime == control_mtime
                    && now.saturating_sub(e.generated_at) <= max_age.as_millis() as u64
            });

            Ok(hit.map(|e| this.slot_path(e.slot)))
        })
    }

    /// Regenerate the cache: write `content` into a slot (reusing the
    /// oldest slot once `max_slots` is reached), then update the index.
    pub fn store(
        &self,
        key: &StatusCacheKey,
        status_mtime: SystemTime,
        control_mtime: SystemTime,
        generated_at: SystemTime,
        content: &str,
    ) -> Result<PathBuf, StorageError> {
        self.with_index_lock(|this| {
            let mut index = this.load_index()?;
            let key_hash = key.hash_value();

            let slot = if index.entries.len() < this.max_slots as usize {
                let slot = index.next_slot;
                index.next_slot = index.next_slot.wrapping_add(1);
                slot
            } else {
                // Replace the oldest entry's slot and drop it from the index.
                let oldest_pos = index
                    .entries
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, e)| e.generated_at)
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                index.entries.remove(oldest_pos).slot
            };

            let path = this.slot_path(slot);
            write_atomic(&path, content.as_bytes())?;

            index.entries.retain(|e| e.key_hash != key_hash);
            index.entries.push(CacheEntry {
                key_hash,
                slot,
                status_mtime: system_time_to_epoch(status_mtime),
                control_mtime: system_time_to_epoch(control_mtime),
                generated_at: system_time_to_epoch(generated_at),
            });
            this.save_index(&index)?;

            Ok(path)
        })
    }
}
