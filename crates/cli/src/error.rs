// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach lpd at {0}: {1}")]
    Connect(String, std::io::Error),

    #[error("I/O error talking to lpd: {0}")]
    Io(#[from] std::io::Error),

    #[error("lpd's reply was not valid UTF-8")]
    InvalidReply,

    #[error("no queue specified")]
    MissingQueue,
}
