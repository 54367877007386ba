// SPDX-License-Identifier: MIT

//! The fixed opcode bytes of the line-printer wire protocol (spec §4.8,
//! §4.10). Exact values are part of the wire format and must never change.

/// Top-level request opcodes (spec §4.8 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    PrintJobs = 1,
    ReceiveJob = 2,
    ShortStatus = 3,
    LongStatus = 4,
    RemoveJobs = 5,
    SecureTransfer = 6,
    Control = 7,
}

impl Opcode {
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Decode the first byte of a connection into its opcode (spec §4.8:
    /// "the first byte sent determines the request type").
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Opcode::PrintJobs),
            2 => Some(Opcode::ReceiveJob),
            3 => Some(Opcode::ShortStatus),
            4 => Some(Opcode::LongStatus),
            5 => Some(Opcode::RemoveJobs),
            6 => Some(Opcode::SecureTransfer),
            7 => Some(Opcode::Control),
            _ => None,
        }
    }
}

/// Sub-opcodes within a `\2` (receive job) connection (spec §4.8 "Within
/// `\2`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveSubOpcode {
    Abort = 1,
    ControlFile = 2,
    DataFile = 3,
}

impl ReceiveSubOpcode {
    pub fn byte(self) -> u8 {
        self as u8
    }
}

/// `C` (client-origin) or `F` (server-forwarded) tag in the secure-transfer
/// header (spec §4.10 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeOrigin {
    Client,
    Forwarded,
}

impl EnvelopeOrigin {
    pub fn letter(self) -> char {
        match self {
            EnvelopeOrigin::Client => 'C',
            EnvelopeOrigin::Forwarded => 'F',
        }
    }
}

pub const ACK: u8 = 0;
