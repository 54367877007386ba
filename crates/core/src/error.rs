// SPDX-License-Identifier: MIT

//! Crate-boundary error type. Distinct from [`crate::outcome::JobOutcome`]
//! (spec §7 taxonomy): `CoreError` is a normal Rust error for malformed
//! input, converted into a `JobOutcome` only at the point it affects a
//! job's state machine (spec §7 "Propagation policy").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid priority letter {0:?} (must be A-Z)")]
    InvalidPriority(char),
    #[error("malformed job ticket: missing field {0}")]
    MalformedJobTicket(&'static str),
}
