// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Engine(#[from] lpd_engine::EngineError),

    #[error(transparent)]
    Storage(#[from] lpd_storage::StorageError),

    #[error(transparent)]
    Printcap(#[from] lpd_printcap::PrintcapError),

    #[error(transparent)]
    Adapter(#[from] lpd_adapters::AdapterError),

    #[error("another lpd is already running (lock held at {0})")]
    AlreadyRunning(std::path::PathBuf),

    #[error("malformed request: {0}")]
    Protocol(String),
}
