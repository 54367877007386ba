// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lpd-storage: the spool directory (spec §3 "Spool directory").
//!
//! Every mutation to durable state goes through an atomic write-then-rename
//! (spec invariant 3); this crate is the only place that touches the spool
//! directory's bytes on disk.

mod atomic;
mod bounded_file;
mod control;
mod error;
mod lock;
mod status_cache;
mod ticket_store;

pub use atomic::write_atomic;
pub use bounded_file::BoundedFile;
pub use control::SpoolControl;
pub use error::StorageError;
pub use lock::QueueLock;
pub use status_cache::{StatusCache, StatusCacheKey};
pub use ticket_store::{SpoolLayout, TicketStore};
