// SPDX-License-Identifier: MIT

//! In-memory operational counters, surfaced only through the `\4`
//! long-status reply for the special queue name `all` (spec §4.15) — there
//! is no external metrics endpoint, by design.

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Counts {
    jobs_received: u64,
    jobs_printed: u64,
    jobs_aborted: u64,
}

#[derive(Debug, Default)]
pub struct Counters(Mutex<Counts>);

#[derive(Debug, Clone, Copy, Default)]
pub struct CountersSnapshot {
    pub jobs_received: u64,
    pub jobs_printed: u64,
    pub jobs_aborted: u64,
    pub active_schedulers: usize,
}

impl Counters {
    pub fn record_received(&self) {
        self.0.lock().jobs_received += 1;
    }

    pub fn record_printed(&self) {
        self.0.lock().jobs_printed += 1;
    }

    pub fn record_aborted(&self) {
        self.0.lock().jobs_aborted += 1;
    }

    pub fn snapshot(&self, active_schedulers: usize) -> CountersSnapshot {
        let counts = self.0.lock();
        CountersSnapshot { jobs_received: counts.jobs_received, jobs_printed: counts.jobs_printed, jobs_aborted: counts.jobs_aborted, active_schedulers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let counters = Counters::default();
        counters.record_received();
        counters.record_received();
        counters.record_printed();
        counters.record_aborted();

        let snapshot = counters.snapshot(3);
        assert_eq!(snapshot.jobs_received, 2);
        assert_eq!(snapshot.jobs_printed, 1);
        assert_eq!(snapshot.jobs_aborted, 1);
        assert_eq!(snapshot.active_schedulers, 3);
    }
}
