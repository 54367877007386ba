// SPDX-License-Identifier: MIT

//! Opcodes `\3`/`\4`: short and long status (spec §4.8, §4.9 "Status
//! cache").
//!
//! `all` fans out over every printcap-visible queue (spec §4.8: "iterate
//! the global all-queues list when the printer name is all"); recursing
//! into forwarding destinations and server-group members is not
//! implemented — each queue reports only its own local state.

use crate::error::DaemonError;
use crate::registry::Destination;
use crate::state::DaemonState;
use lpd_core::JobTicket;
use lpd_storage::{SpoolControl, StatusCache, StatusCacheKey, TicketStore};
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncWrite, AsyncWriteExt};

const CACHE_MAX_AGE: Duration = Duration::from_secs(10);

pub async fn handle<S>(stream: &mut S, line: &str, long: bool, state: &DaemonState) -> Result<(), DaemonError>
where
    S: AsyncWrite + Unpin,
{
    let mut tokens = line.split_whitespace();
    let printer = tokens.next().unwrap_or("all").to_string();
    let args: Vec<String> = tokens.map(str::to_string).collect();

    let is_all = printer == "all";
    let queues = if is_all { state.registry.read().await.queue_names() } else { vec![printer] };

    let mut report = String::new();
    for queue in queues {
        match report_for(&queue, &args, long, state).await {
            Ok(text) => report.push_str(&text),
            Err(error) => report.push_str(&format!("{queue}: status unavailable: {error}\n")),
        }
    }

    if is_all && long {
        report.push_str(&render_metrics(state).await);
    }

    stream.write_all(report.as_bytes()).await?;
    Ok(())
}

async fn report_for(queue: &str, args: &[String], long: bool, state: &DaemonState) -> Result<String, DaemonError> {
    let settings = state.registry.read().await.resolve(queue)?;
    let control = SpoolControl::load(&settings.layout.control_path())?;
    let store = TicketStore::new(settings.layout.clone());
    let tickets = store.scan()?;

    let key = StatusCacheKey { printer: queue.to_string(), format: if long { 'l' } else { 's' }, args: args.to_vec() };
    let cache = StatusCache::new(settings.layout.status_cache_dir(), 16);
    let status_mtime = mtime(&settings.layout.status_path());
    let control_mtime = mtime(&settings.layout.control_path());
    let now = SystemTime::now();

    if let Ok(Some(path)) = cache.lookup(&key, status_mtime, control_mtime, CACHE_MAX_AGE, now) {
        if let Ok(text) = std::fs::read_to_string(&path) {
            return Ok(text);
        }
    }

    let text = render(queue, &settings.destination, &control, &tickets, long);
    let _ = cache.store(&key, status_mtime, control_mtime, now, &text);
    Ok(text)
}

/// Long-format `all`-queue footer: the in-memory operational counters
/// (spec §4.15), not cached since they change every job.
async fn render_metrics(state: &DaemonState) -> String {
    let snapshot = state.metrics.snapshot(state.active_scheduler_count().await);
    format!(
        "daemon: {} received, {} printed, {} aborted, {} active scheduler(s)\n",
        snapshot.jobs_received, snapshot.jobs_printed, snapshot.jobs_aborted, snapshot.active_schedulers
    )
}

fn mtime(path: &std::path::Path) -> SystemTime {
    std::fs::metadata(path).and_then(|m| m.modified()).unwrap_or(SystemTime::UNIX_EPOCH)
}

fn render(queue: &str, destination: &Option<Destination>, control: &SpoolControl, tickets: &[JobTicket], long: bool) -> String {
    let mut out = String::new();
    let state_word = if control.printing_disabled { "disabled" } else { "enabled" };
    out.push_str(&format!("{queue} is ready and printing is {state_word}\n"));

    if let Some(message) = &control.operator_message {
        out.push_str(&format!("  {message}\n"));
    }
    if destination.is_none() {
        out.push_str("  warning: no device or remote destination configured\n");
    }

    if tickets.is_empty() {
        out.push_str("no entries\n");
        return out;
    }

    let mut ordered: Vec<&JobTicket> = tickets.iter().collect();
    ordered.sort_by_key(|t| (t.priority.0, t.number));

    for (rank, ticket) in ordered.iter().enumerate() {
        let names: Vec<&str> = ticket.data_files.iter().map(|f| f.user_filename.as_str()).collect();
        let size = ticket.total_size();
        if long {
            out.push_str(&format!(
                "{:<3} {:<10} {:<20} {:>8} bytes  attempt {}\n",
                rank + 1,
                ticket.logname,
                names.join(", "),
                size,
                ticket.attempt
            ));
            if let Some(error) = &ticket.error {
                out.push_str(&format!("    error: {error}\n"));
            }
        } else {
            out.push_str(&format!("{:<3} {:<10} {:<20} {:>8} bytes\n", rank + 1, ticket.logname, names.join(", "), size));
        }
    }
    out
}
