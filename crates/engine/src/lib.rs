// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lpd-engine: the parts of the per-queue scheduler that don't belong to
//! storage, printcap resolution, or the filter runner — job selection
//! (spec §4.6 steps 2-3), the per-job state machine, outcome
//! classification and retry backoff (spec §4.6 step 7), and the print
//! pipeline that turns a selected job into device writes (spec §4.5).

mod action;
mod backoff;
mod error;
mod pipeline;
mod queue_scan;
mod state;

pub use action::classify;
pub use backoff::Backoff;
pub use error::EngineError;
pub use pipeline::{DataFileSpec, PipelineConfig, PrintPipeline};
pub use queue_scan::{printable_tickets, select_head};
pub use state::{JobState, Transition};
