// SPDX-License-Identifier: MIT

//! Crate-boundary error type for the transport adapters.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("peer rejected transfer (status byte {0})")]
    Nak(u8),

    #[error("operation on {0} timed out")]
    Timeout(&'static str),

    #[error("malformed reply from peer: {0}")]
    Protocol(String),
}
