// SPDX-License-Identifier: MIT

//! Advisory locking for the per-queue `lock` file (spec invariant 1:
//! "Exactly one scheduler per queue").

use crate::error::StorageError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// An exclusive advisory lock held on a queue's `lock` file for the
/// scheduler's lifetime. Dropping it releases the lock.
pub struct QueueLock {
    file: File,
    path: PathBuf,
}

impl QueueLock {
    /// Try to acquire the lock, writing the current process id into the
    /// file once held (matching the conventional use of the `lock` file as
    /// a pid record, spec §3).
    ///
    /// Does not truncate before locking: if another scheduler holds the
    /// lock, its pid must remain legible for operators inspecting the file.
    pub fn acquire(path: &Path) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StorageError::io(path, e))?;

        file.try_lock_exclusive()
            .map_err(|_| StorageError::LockHeld(path.to_path_buf()))?;

        let mut file = file;
        file.set_len(0).map_err(|e| StorageError::io(path, e))?;
        writeln!(file, "{}", std::process::id()).map_err(|e| StorageError::io(path, e))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for QueueLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_writes_the_current_pid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lock");
        let _lock = QueueLock::acquire(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), std::process::id().to_string());
    }

    #[test]
    fn second_acquire_on_the_same_file_fails_while_the_first_is_held() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lock");
        let _first = QueueLock::acquire(&path).unwrap();
        let second = QueueLock::acquire(&path);
        assert!(matches!(second, Err(StorageError::LockHeld(_))));
    }

    #[test]
    fn dropping_the_lock_allows_reacquiring_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lock");
        {
            let _lock = QueueLock::acquire(&path).unwrap();
        }
        assert!(QueueLock::acquire(&path).is_ok());
    }
}
