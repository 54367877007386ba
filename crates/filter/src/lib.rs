// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lpd-filter: the filter runner (spec §4.4) — argv assembly via
//! `$`-expansion, environment construction, process spawning, and the
//! timeout watchdog.

mod env;
mod error;
mod expand;
mod runner;
mod tokenize;
mod watchdog;

pub use env::FilterEnvironment;
pub use error::FilterError;
pub use expand::{expand_token, unescape, ExpansionFields};
pub use runner::FilterRunner;
pub use tokenize::tokenize;
pub use watchdog::Watchdog;
