// SPDX-License-Identifier: MIT

//! Shared state handed to every connection handler and scheduler task
//! (spec §4.7 step 4's "children re-read configuration from disk on
//! `SIGHUP`" — `registry` is the thing that gets swapped on reload).

use crate::config::Config;
use crate::metrics::Counters;
use crate::registry::Registry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, RwLock};

pub struct DaemonState {
    pub config: Arc<Config>,
    pub registry: Arc<RwLock<Registry>>,
    pub metrics: Arc<Counters>,
    wakes: Mutex<HashMap<String, Arc<Notify>>>,
    scheduled: Mutex<HashSet<String>>,
}

impl DaemonState {
    pub fn new(config: Arc<Config>, registry: Registry) -> Arc<Self> {
        Arc::new(Self {
            config,
            registry: Arc::new(RwLock::new(registry)),
            metrics: Arc::new(Counters::default()),
            wakes: Mutex::new(HashMap::new()),
            scheduled: Mutex::new(HashSet::new()),
        })
    }

    /// Number of queues with a scheduler task currently running, for the
    /// `all`-queue long-status metrics line (spec §4.15).
    pub async fn active_scheduler_count(&self) -> usize {
        self.scheduled.lock().await.len()
    }

    /// Record that `queue` already has a scheduler task running; returns
    /// `true` if this is the first time (i.e. the caller should spawn one).
    pub async fn claim_scheduler(&self, queue: &str) -> bool {
        self.scheduled.lock().await.insert(queue.to_string())
    }

    /// The `Notify` a queue's scheduler task waits on; created on first
    /// reference so the dispatcher and the scheduler agree on which
    /// instance to use regardless of which one asks first.
    pub async fn wake_handle(&self, queue: &str) -> Arc<Notify> {
        let mut wakes = self.wakes.lock().await;
        wakes.entry(queue.to_string()).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    /// Wake `queue`'s scheduler if one is already registered for it (spec
    /// §4.8 opcode `\1` "print jobs").
    pub async fn wake_queue(&self, queue: &str) {
        if let Some(notify) = self.wakes.lock().await.get(queue) {
            notify.notify_one();
        }
    }
}
