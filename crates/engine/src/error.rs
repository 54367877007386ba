// SPDX-License-Identifier: MIT

//! Crate-boundary error type for the scheduling/print-pipeline engine.

use lpd_adapters::AdapterError;
use lpd_filter::FilterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("storage error: {0}")]
    Storage(#[from] lpd_storage::StorageError),

    #[error("no destination configured for queue {0}")]
    NoDestination(String),
}
