// SPDX-License-Identifier: MIT

//! Opcode `\2` (and the post-header tail of `\6`): accept a job's control
//! and data files (spec §4.8 "receive a job", invariant 3's "no `hf*` file
//! is left" on an incomplete transfer).
//!
//! The wire control file keeps its legacy line-oriented shape (`Hhost`,
//! `Pname`, `Jname`, `Cclass`, one format-letter line per data file) for
//! wire compatibility (spec §6 "Control-file image is preserved verbatim
//! for wire compatibility"); this handler translates just enough of it
//! (host, user, class, job name) into the key=value [`lpd_core::JobTicket`]
//! that everything downstream of receive actually reads. Per-file format
//! letters are not threaded through — every received data file defaults to
//! format `f`, overridable later via LPC.

use super::{ack, nak, read_line, sub_opcode_of};
use crate::error::DaemonError;
use crate::state::DaemonState;
use lpd_adapters::ReceiveSubOpcode;
use lpd_core::{DataFile, JobTicket, JobTicketConfig, Priority, QueueFile};
use lpd_printcap::{evaluate, Context, Service};
use lpd_storage::{write_atomic, TicketStore};
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

pub async fn handle<S>(stream: &mut S, line: &str, peer_host: &str, state: &DaemonState) -> Result<(), DaemonError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let queue = line.split_whitespace().next().unwrap_or_default().to_string();
    if queue.is_empty() {
        return nak(stream, 1).await;
    }

    // No user identity exists yet at this point in the handshake — the
    // submitting user only appears later, inside the control file's `P`
    // line, by which point permission has already been checked against
    // host/printer alone (DESIGN.md "ctx.user aliasing").
    let ctx = Context {
        service: Some(Service::Receive),
        remote_host: peer_host.to_string(),
        printer: queue.clone(),
        ..Default::default()
    };
    if evaluate(state.registry.read().await.rules(), &ctx) == lpd_printcap::Verdict::Reject {
        tracing::warn!(queue, peer_host, "receive rejected by permissions");
        return nak(stream, 1).await;
    }

    let settings = state.registry.read().await.resolve(&queue)?;
    settings.layout.ensure_exists(state.config.spool_dir_perms)?;

    let mut control_text: Option<String> = None;
    let mut control_identity: Option<(char, u32, String)> = None;
    let mut data_paths: Vec<PathBuf> = Vec::new();
    let mut data_sizes: Vec<u64> = Vec::new();
    let mut data_filenames: Vec<String> = Vec::new();

    let result = receive_loop(stream, &settings.layout, &mut control_text, &mut control_identity, &mut data_paths, &mut data_sizes, &mut data_filenames).await;

    if result.is_err() || control_text.is_none() {
        for path in &data_paths {
            let _ = std::fs::remove_file(path);
        }
        return Ok(());
    }

    let Some((priority, number, host)) = control_identity else {
        for path in &data_paths {
            let _ = std::fs::remove_file(path);
        }
        return Ok(());
    };

    let fields = parse_legacy_control(control_text.as_deref().unwrap_or_default());
    let mut ticket = JobTicket::new(JobTicketConfig {
        identifier: format!("{host}-{number}"),
        number,
        hostname: host.clone(),
        priority: Priority::new(priority).unwrap_or(Priority::DEFAULT),
        class: fields.class,
        logname: fields.user.unwrap_or_else(|| "unknown".to_string()),
        from_host: peer_host.to_string(),
        auth_user: None,
    });

    for ((path, size), filename) in data_paths.iter().zip(&data_sizes).zip(&data_filenames) {
        let mut data_file = DataFile::new(path.clone(), filename.clone(), 'f', *size);
        data_file.user_filename = filename.clone();
        ticket.data_files.push(data_file);
    }

    let store = TicketStore::new(settings.layout.clone());
    store.write(&ticket)?;
    tracing::info!(job = ticket.identifier, queue, "job received");
    state.metrics.record_received();
    state.wake_queue(&queue).await;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn receive_loop<S>(
    stream: &mut S,
    layout: &lpd_storage::SpoolLayout,
    control_text: &mut Option<String>,
    control_identity: &mut Option<(char, u32, String)>,
    data_paths: &mut Vec<PathBuf>,
    data_sizes: &mut Vec<u64>,
    data_filenames: &mut Vec<String>,
) -> Result<(), DaemonError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let mut sub_byte = [0u8; 1];
        if stream.read_exact(&mut sub_byte).await.is_err() {
            return Ok(());
        }
        let Some(sub_opcode) = sub_opcode_of(sub_byte[0]) else {
            return Ok(());
        };

        match sub_opcode {
            ReceiveSubOpcode::Abort => return Ok(()),
            ReceiveSubOpcode::ControlFile => {
                let (size, name) = read_header(stream).await?;
                let bytes = read_body(stream, size).await?;
                let parsed = QueueFile::parse(&name);
                let path = match &parsed {
                    Some(p) => layout.control_file_path(p.priority, p.number, &p.host),
                    None => layout.queue_dir().join(&name),
                };
                write_atomic(&path, &bytes)?;
                *control_text = Some(String::from_utf8_lossy(&bytes).into_owned());
                if let Some(p) = parsed {
                    *control_identity = Some((p.priority, p.number, p.host));
                }
                ack(stream).await?;
            }
            ReceiveSubOpcode::DataFile => {
                let (size, name) = read_header(stream).await?;
                let bytes = read_body(stream, size).await?;
                let index = data_paths.len();
                let letter = (b'a' + (index as u8 % 26)) as char;
                let path = match control_identity {
                    Some((priority, number, host)) => layout.data_file_path(letter, *priority, *number, host),
                    None => layout.queue_dir().join(&name),
                };
                write_atomic(&path, &bytes)?;
                data_paths.push(path);
                data_sizes.push(size);
                data_filenames.push(name);
                ack(stream).await?;
            }
        }
    }
}

async fn read_header<S: AsyncRead + Unpin>(stream: &mut S) -> Result<(u64, String), DaemonError> {
    let line = read_line(stream).await?;
    let mut parts = line.trim_end().splitn(2, ' ');
    let size: u64 = parts.next().unwrap_or_default().parse().unwrap_or(0);
    let name = parts.next().unwrap_or_default().to_string();
    Ok((size, name))
}

async fn read_body<S: AsyncRead + Unpin>(stream: &mut S, size: u64) -> Result<Vec<u8>, DaemonError> {
    let mut buf = vec![0u8; size as usize];
    stream.read_exact(&mut buf).await?;
    Ok(buf)
}

#[derive(Default)]
struct LegacyFields {
    user: Option<String>,
    class: Option<String>,
}

/// Pulls `P` (user) and `C` (class) out of a legacy single-letter control
/// file; every other line is ignored.
fn parse_legacy_control(text: &str) -> LegacyFields {
    let mut fields = LegacyFields::default();
    for line in text.lines() {
        let Some((letter, rest)) = line.split_at_checked(1) else { continue };
        match letter {
            "P" => fields.user = Some(rest.to_string()),
            "C" => fields.class = Some(rest.to_string()),
            _ => {}
        }
    }
    fields
}
