// SPDX-License-Identifier: MIT

//! Size-bounded append-only files: a queue's `status` and `log` (spec §3).
//! "Status and log files are append-only with periodic trim (the trimmer
//! renames into place)" (spec §5 "Shared resources").

use crate::atomic::write_atomic;
use crate::error::StorageError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct BoundedFile {
    path: PathBuf,
    max_bytes: u64,
}

impl BoundedFile {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            path: path.into(),
            max_bytes,
        }
    }

    /// Append one line (a trailing newline is added if missing), then trim
    /// if the file has grown past `max_bytes`.
    pub fn append_line(&self, line: &str) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::io(&self.path, e))?;
        writeln!(file, "{line}").map_err(|e| StorageError::io(&self.path, e))?;
        drop(file);
        self.trim_if_needed()
    }

    pub fn read_all(&self) -> Result<String, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(StorageError::io(&self.path, e)),
        }
    }

    /// Keep only the trailing, newline-aligned portion of the file under
    /// `max_bytes`; the rewrite is atomic so concurrent readers never see a
    /// partially-trimmed file.
    fn trim_if_needed(&self) -> Result<(), StorageError> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };
        if metadata.len() <= self.max_bytes {
            return Ok(());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| StorageError::io(&self.path, e))?;
        let trimmed = trim_to_tail(&contents, self.max_bytes);
        write_atomic(&self.path, trimmed.as_bytes())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn trim_to_tail(contents: &str, max_bytes: u64) -> &str {
    if contents.len() as u64 <= max_bytes {
        return contents;
    }
    let cut_at = contents.len() - max_bytes as usize;
    match contents[cut_at..].find('\n') {
        Some(newline_offset) => &contents[cut_at + newline_offset + 1..],
        None => "",
    }
}
