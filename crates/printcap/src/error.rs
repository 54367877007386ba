// SPDX-License-Identifier: MIT

//! Crate-boundary error type (spec §4.13).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrintcapError {
    #[error("printer {0:?} not found in printcap")]
    NotFound(String),
    #[error("tc= inclusion depth exceeded resolving {0:?} (possible cycle)")]
    TcDepthExceeded(String),
    #[error("unclosed continuation line in printcap source")]
    UnterminatedContinuation,
}
