// SPDX-License-Identifier: MIT

//! Filter timeout enforcement with the status-file mtime grace rule (spec
//! §4.4: "Timeouts are defined by the caller and enforced by a watchdog
//! using a monotonic clock plus a grace rule: if the filter has written
//! to its status file within the timeout window, extend accordingly").

use lpd_core::Clock;
use std::time::{Duration, Instant};

pub struct Watchdog<C: Clock> {
    clock: C,
    timeout: Duration,
    deadline: Instant,
}

impl<C: Clock> Watchdog<C> {
    pub fn new(clock: C, timeout: Duration) -> Self {
        let deadline = clock.now() + timeout;
        Self { clock, timeout, deadline }
    }

    /// Extend the deadline if the status file was touched more recently
    /// than `timeout` ago.
    pub fn observe_status_mtime(&mut self, status_mtime_epoch_ms: u64) {
        let now_ms = self.clock.epoch_ms();
        if now_ms.saturating_sub(status_mtime_epoch_ms) < self.timeout.as_millis() as u64 {
            self.deadline = self.clock.now() + self.timeout;
        }
    }

    pub fn expired(&self) -> bool {
        self.clock.now() >= self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpd_core::FakeClock;

    #[test]
    fn not_expired_immediately_after_creation() {
        let watchdog = Watchdog::new(FakeClock::new(), Duration::from_secs(30));
        assert!(!watchdog.expired());
    }

    #[test]
    fn expires_once_timeout_elapses() {
        let clock = FakeClock::new();
        let watchdog = Watchdog::new(clock.clone(), Duration::from_secs(30));
        clock.advance(Duration::from_secs(31));
        assert!(watchdog.expired());
    }

    #[test]
    fn recent_status_activity_extends_the_deadline() {
        let clock = FakeClock::new();
        let mut watchdog = Watchdog::new(clock.clone(), Duration::from_secs(30));
        clock.advance(Duration::from_secs(25));
        watchdog.observe_status_mtime(clock.epoch_ms());
        clock.advance(Duration::from_secs(10));
        assert!(!watchdog.expired());
    }

    #[test]
    fn stale_status_activity_does_not_extend_the_deadline() {
        let clock = FakeClock::new();
        let mut watchdog = Watchdog::new(clock.clone(), Duration::from_secs(30));
        let stale_mtime = clock.epoch_ms();
        clock.advance(Duration::from_secs(40));
        watchdog.observe_status_mtime(stale_mtime);
        assert!(watchdog.expired());
    }
}
