// SPDX-License-Identifier: MIT

//! Resolves a worker's [`JobOutcome`] into the scheduler's per-job action
//! (spec §4.6 step 7), applying the one rule [`JobOutcomeBucket`] can't
//! express on its own: a retryable outcome converts to abort once the
//! job's attempt count exceeds the queue's configured maximum.

use lpd_core::{JobOutcome, JobOutcomeBucket};

/// Classify `outcome` given the job's attempt count (after this attempt)
/// and the queue's `max_attempts`.
pub fn classify(outcome: JobOutcome, attempt: u32, max_attempts: u32) -> JobOutcomeBucket {
    match outcome.bucket() {
        JobOutcomeBucket::Retry if attempt > max_attempts => JobOutcomeBucket::Abort,
        bucket => bucket,
    }
}
