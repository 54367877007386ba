// SPDX-License-Identifier: MIT

//! Opcode `\7`: LPC administrative commands (spec §4.8 table, glossary
//! "LPC"). Subset implemented: `enable`/`disable` (printing),
//! `up`/`down` (spooling), `abort`, `start` (wake), `hold`/`release`.

use crate::error::DaemonError;
use crate::state::DaemonState;
use lpd_core::{Clock, SystemClock};
use lpd_printcap::{evaluate, Context, Service, Verdict};
use lpd_storage::{SpoolControl, TicketStore};
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub async fn handle<S>(stream: &mut S, line: &str, peer_host: &str, state: &DaemonState) -> Result<(), DaemonError>
where
    S: AsyncWrite + Unpin,
{
    let mut tokens = line.split_whitespace();
    let Some(command) = tokens.next() else {
        stream.write_all(b"missing LPC command\n").await?;
        return Ok(());
    };
    let queue = tokens.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = tokens.collect();

    // LPC's wire line (`command queue arg...`) carries no user token, so
    // unlike remove.rs there is no remote-claimed identity to alias `user`
    // to here; `user`/`remote_user` stay at their default and rules gate
    // LPC on `host`/`printer`/`lpc` instead (DESIGN.md "ctx.user aliasing").
    let ctx = Context {
        service: Some(Service::Control),
        remote_host: peer_host.to_string(),
        printer: queue.clone(),
        lpc: true,
        ..Default::default()
    };
    if evaluate(state.registry.read().await.rules(), &ctx) == Verdict::Reject {
        stream.write_all(b"permission denied\n").await?;
        return Ok(());
    }

    let reply = match run_command(command, &queue, &rest, state).await {
        Ok(text) => text,
        Err(error) => format!("{queue}: {error}\n"),
    };
    stream.write_all(reply.as_bytes()).await?;
    Ok(())
}

async fn run_command(command: &str, queue: &str, args: &[&str], state: &DaemonState) -> Result<String, DaemonError> {
    if queue.is_empty() {
        return Ok("no queue specified\n".to_string());
    }
    let settings = state.registry.read().await.resolve(queue)?;

    match command {
        "enable" => set_control(&settings.layout.control_path(), |c| c.printing_disabled = false, queue, "printing enabled"),
        "disable" => set_control(&settings.layout.control_path(), |c| c.printing_disabled = true, queue, "printing disabled"),
        "up" => set_control(&settings.layout.control_path(), |c| c.spooling_disabled = false, queue, "queuing enabled"),
        "down" => set_control(&settings.layout.control_path(), |c| c.spooling_disabled = true, queue, "queuing disabled"),
        "abort" => set_control(&settings.layout.control_path(), |c| c.aborted = true, queue, "scheduler aborted"),
        "start" => {
            state.wake_queue(queue).await;
            Ok(format!("{queue}: scheduler started\n"))
        }
        "hold" | "release" => {
            let held = command == "hold";
            let store = TicketStore::new(settings.layout.clone());
            let mut changed = 0;
            for mut ticket in store.scan()? {
                if args.iter().any(|a| *a == ticket.number.to_string()) {
                    ticket.hold_time = if held { SystemClock.epoch_ms() } else { 0 };
                    store.write(&ticket)?;
                    changed += 1;
                }
            }
            state.wake_queue(queue).await;
            Ok(format!("{queue}: {changed} job(s) {command}d\n"))
        }
        other => Ok(format!("{queue}: unknown LPC command {other}\n")),
    }
}

fn set_control(path: &std::path::Path, mutate: impl FnOnce(&mut SpoolControl), queue: &str, message: &str) -> Result<String, DaemonError> {
    let mut control = SpoolControl::load(path)?;
    mutate(&mut control);
    control.save(path)?;
    Ok(format!("{queue}: {message}\n"))
}
