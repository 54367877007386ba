// SPDX-License-Identifier: MIT

//! Opcode `\5`: remove jobs (spec §4.8, §7 "Remove operations report
//! per-job outcomes").
//!
//! `all` fans out over every printcap-visible queue (spec §4.8: "iterate
//! the global all-queues list when the printer name is all"), the same
//! special-casing `handlers/status.rs` does; recursing into forwarding
//! destinations and server-group members is not implemented — each queue
//! only removes jobs spooled locally for it.

use crate::error::DaemonError;
use crate::state::DaemonState;
use lpd_core::{Clock, SystemClock};
use lpd_printcap::{evaluate, Context, Service, Verdict};
use lpd_storage::TicketStore;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub async fn handle<S>(stream: &mut S, line: &str, peer_host: &str, state: &DaemonState) -> Result<(), DaemonError>
where
    S: AsyncWrite + Unpin,
{
    let mut tokens = line.split_whitespace();
    let queue = tokens.next().unwrap_or_default().to_string();
    let user = tokens.next().unwrap_or_default().to_string();
    let patterns: Vec<String> = tokens.map(str::to_string).collect();

    if queue.is_empty() {
        stream.write_all(b"no queue specified\n").await?;
        return Ok(());
    }

    let queues = if queue == "all" { state.registry.read().await.queue_names() } else { vec![queue.clone()] };

    let mut report = String::new();
    for queue in queues {
        match remove_from_queue(&queue, &user, &patterns, peer_host, state).await {
            Ok(text) => report.push_str(&text),
            Err(error) => report.push_str(&format!("{queue}: remove failed: {error}\n")),
        }
    }

    stream.write_all(report.as_bytes()).await?;
    Ok(())
}

async fn remove_from_queue(queue: &str, user: &str, patterns: &[String], peer_host: &str, state: &DaemonState) -> Result<String, DaemonError> {
    // `user` aliases the client-claimed `remote_user`: remove is the one
    // request in this daemon whose wire line carries a user token at all,
    // and nothing downstream distinguishes an authenticated user from a
    // claimed one, so a `user=` permission clause sees the same identity a
    // `remoteuser=` clause would (DESIGN.md "ctx.user aliasing").
    let ctx = Context {
        service: Some(Service::Remove),
        remote_host: peer_host.to_string(),
        user: user.to_string(),
        remote_user: user.to_string(),
        printer: queue.to_string(),
        ..Default::default()
    };
    if evaluate(state.registry.read().await.rules(), &ctx) == Verdict::Reject {
        return Ok(format!("{queue}: permission denied\n"));
    }

    let settings = state.registry.read().await.resolve(queue)?;
    let store = TicketStore::new(settings.layout.clone());
    let tickets = store.scan()?;

    let mut report = String::new();
    for mut ticket in tickets {
        if !matches(&ticket, user, patterns) {
            continue;
        }
        // A job actively printing can't be unlinked out from under its
        // worker; mark it removed so the scheduler's next pass skips and
        // physically deletes it (matches `print_one`'s own `Remove` bucket
        // handling in scheduler.rs). One not currently being printed is
        // unlinked immediately, matching spec's "destroyed when removed"
        // wording rather than leaving a remove-time-stamped file behind
        // that nothing ever reaps.
        if ticket.server_pid.is_some() {
            ticket.remove_time = SystemClock.epoch_ms();
            store.write(&ticket)?;
        } else {
            store.remove(&ticket)?;
        }
        report.push_str(&format!("{}@{queue}: job {} removed\n", ticket.logname, ticket.identifier));
    }

    if report.is_empty() {
        report.push_str(&format!("{queue}: no matching jobs\n"));
    }
    state.wake_queue(queue).await;
    Ok(report)
}

fn matches(ticket: &lpd_core::JobTicket, user: &str, patterns: &[String]) -> bool {
    if patterns.iter().any(|p| p == "-") {
        return ticket.logname == user;
    }
    patterns.iter().any(|p| p == &ticket.number.to_string() || p == &ticket.logname || p == &ticket.identifier)
}
