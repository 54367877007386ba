// SPDX-License-Identifier: MIT

//! The closed error taxonomy every filter/printer-worker exit maps into
//! (spec §7 "Error taxonomy"). This is the single vocabulary the scheduler's
//! state machine (spec §4.6) reacts to — every other error type in the
//! workspace is converted into a [`JobOutcome`] at the point it affects a
//! job, never propagated past that boundary as-is.

use serde::{Deserialize, Serialize};

/// Outcome of a filter/printer-worker attempt, closed per spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobOutcome {
    /// Operation completed, no retry.
    Success,
    /// Transient; retry after backoff, bounded by attempt count.
    Fail,
    /// Permanent for this attempt; requeue for operator, no auto-retry.
    FailNoRetry,
    /// Job cannot proceed; move to error state, optionally mail operator.
    Abort,
    /// Job should be silently discarded.
    Remove,
    /// Stop this job, keep in queue.
    Hold,
    /// Treated as `Fail` unless status-file activity observed within grace,
    /// in which case retry immediately (caller resolves the grace check and
    /// passes the already-resolved variant here).
    Timeout,
    /// I/O error writing to the device or network; treated as `Fail`.
    WriteError,
    /// I/O error reading from the device or network; treated as `Fail`.
    ReadError,
    /// Subprocess died on a signal; treated as `Abort`.
    Signal,
    /// Subprocess anomaly other than signal death; treated as `Fail`.
    Child,
    /// Administrative; treated as `Hold`.
    NoSpool,
    /// Administrative; treated as `Hold`.
    NoPrint,
}

impl JobOutcome {
    /// Map a filter/printer-worker process exit code to an outcome, per the
    /// fixed convention in spec §4.4 ("Filter runner" / "Exit semantics").
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => JobOutcome::Success,
            1 => JobOutcome::Fail,
            2 => JobOutcome::Abort,
            3 => JobOutcome::Remove,
            4 => JobOutcome::Hold,
            5 => JobOutcome::NoSpool,
            6 => JobOutcome::NoPrint,
            7 => JobOutcome::Fail, // "retry"
            8 => JobOutcome::Hold, // "suspend"
            9 => JobOutcome::FailNoRetry,
            10 => JobOutcome::Timeout,
            11 => JobOutcome::WriteError,
            12 => JobOutcome::ReadError,
            13 => JobOutcome::Child,
            14 => JobOutcome::Success, // "no-wait": worker detached successfully
            _ => JobOutcome::Fail,
        }
    }

    /// Map a fatal signal number (process died on a signal) to an outcome.
    pub fn from_signal(_signal: i32) -> Self {
        JobOutcome::Signal
    }

    /// Collapse the taxonomy to the handful of buckets the scheduler's
    /// state machine actually branches on (spec §4.6 step 7).
    pub fn bucket(self) -> JobOutcomeBucket {
        match self {
            JobOutcome::Success => JobOutcomeBucket::Success,
            JobOutcome::Fail
            | JobOutcome::Timeout
            | JobOutcome::WriteError
            | JobOutcome::ReadError
            | JobOutcome::Child => JobOutcomeBucket::Retry,
            JobOutcome::FailNoRetry | JobOutcome::Abort | JobOutcome::Signal => {
                JobOutcomeBucket::Abort
            }
            JobOutcome::Remove => JobOutcomeBucket::Remove,
            JobOutcome::Hold | JobOutcome::NoSpool | JobOutcome::NoPrint => {
                JobOutcomeBucket::Hold
            }
        }
    }
}

/// The handful of buckets the scheduler's state machine transitions on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcomeBucket {
    Success,
    Retry,
    Abort,
    Remove,
    Hold,
}

/// Status reported on a filter's stderr status line, tagged with the
/// filter's title (spec §4.5 "Status handling").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStatus {
    pub title: String,
    pub message: String,
}

impl FilterStatus {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_zero_is_success() {
        assert_eq!(JobOutcome::from_exit_code(0), JobOutcome::Success);
    }

    #[test]
    fn retry_bucket_covers_transient_outcomes() {
        for code in [1, 7, 10, 11, 12, 13] {
            assert_eq!(JobOutcome::from_exit_code(code).bucket(), JobOutcomeBucket::Retry);
        }
    }

    #[test]
    fn signal_death_maps_to_abort_bucket() {
        assert_eq!(JobOutcome::from_signal(9).bucket(), JobOutcomeBucket::Abort);
    }

    #[test]
    fn administrative_codes_map_to_hold() {
        assert_eq!(JobOutcome::from_exit_code(5).bucket(), JobOutcomeBucket::Hold);
        assert_eq!(JobOutcome::from_exit_code(6).bucket(), JobOutcomeBucket::Hold);
        assert_eq!(JobOutcome::from_exit_code(8).bucket(), JobOutcomeBucket::Hold);
    }

    #[test]
    fn unknown_exit_code_defaults_to_retryable_fail() {
        assert_eq!(JobOutcome::from_exit_code(99), JobOutcome::Fail);
    }
}
