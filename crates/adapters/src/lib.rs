// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! lpd-adapters: device/transport adapters (spec §4.5, §4.7, §4.10) — a
//! local device writer, a remote-host forwarder speaking the wire
//! protocol's receive and secure-transfer framing, and status-line sinks.

mod device;
mod error;
mod forward;
mod status_sink;
mod traced;
mod wire;

pub use device::{DeviceWriter, LocalDevice};
pub use error::AdapterError;
pub use forward::{Envelope, NamedFile, RemoteForwarder, RemoteTarget, SecureParams, TcpForwarder};
pub use status_sink::{AppendFileStatusSink, DualStatusSink, StatusSink, TracingStatusSink};
pub use traced::Traced;
pub use wire::{EnvelopeOrigin, Opcode, ReceiveSubOpcode, ACK};

#[cfg(any(test, feature = "test-support"))]
pub use device::FakeDevice;
#[cfg(any(test, feature = "test-support"))]
pub use forward::{FakeForwarder, ForwardCall};
#[cfg(any(test, feature = "test-support"))]
pub use status_sink::FakeStatusSink;
