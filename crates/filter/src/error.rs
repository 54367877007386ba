// SPDX-License-Identifier: MIT

//! Crate-boundary error type (spec §4.13).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("failed to spawn filter {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("filter {command:?} exceeded its timeout")]
    Timeout { command: String },
    #[error("empty filter command")]
    EmptyCommand,
}
