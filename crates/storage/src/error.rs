// SPDX-License-Identifier: MIT

//! Crate-boundary error type (spec §4.13).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("advisory lock on {0} is already held")]
    LockHeld(PathBuf),
    #[error("spool directory {0} does not exist")]
    NoSpoolDir(PathBuf),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
