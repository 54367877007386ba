// SPDX-License-Identifier: MIT

//! Per-job state machine (spec §4.6 "State machine (per job)").

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    New,
    Ready,
    Active,
    Done,
    RetryWait,
    Held,
    Aborted,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    ReceiveSucceeded,
    SchedulerSelected,
    WorkerSucceeded,
    WorkerRetryable,
    BackoffElapsedOrWoken,
    HeldByControl,
    AuthorizedRemove,
}

impl JobState {
    /// Apply `transition`, returning the resulting state, or `None` if the
    /// transition is not valid from the current state.
    pub fn apply(self, transition: Transition) -> Option<JobState> {
        use JobState::*;
        use Transition::*;
        match (self, transition) {
            (_, AuthorizedRemove) => Some(Removed),
            (New, ReceiveSucceeded) => Some(Ready),
            (Ready, SchedulerSelected) => Some(Active),
            (Active, WorkerSucceeded) => Some(Done),
            (Active, WorkerRetryable) => Some(RetryWait),
            (RetryWait, BackoffElapsedOrWoken) => Some(Ready),
            (Ready, HeldByControl) => Some(Held),
            (Active, HeldByControl) => Some(Held),
            _ => None,
        }
    }
}
