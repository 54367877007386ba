// SPDX-License-Identifier: MIT

//! The dispatcher: binds the listening sockets, spawns one task per
//! accepted connection, and keeps a scheduler task running for every
//! queue named in printcap (spec §4.7).
//!
//! A real fork-per-connection / fork-per-queue daemon has no shared
//! memory between its children; this implementation keeps that contract
//! at the data level (every cross-task interaction goes through
//! [`crate::state::DaemonState`]'s files-and-locks-backed types or a
//! `Notify` wakeup) while using tokio tasks in place of `fork()`.

use crate::error::DaemonError;
use crate::state::DaemonState;
use crate::{handlers, scheduler};
use std::sync::Arc;
use tokio::net::{TcpListener, UnixListener};
use tokio::sync::Semaphore;
use tracing::Instrument;

pub async fn run(state: Arc<DaemonState>) -> Result<(), DaemonError> {
    let tcp_listener = match state.config.tcp_port {
        Some(port) => Some(TcpListener::bind((state.config.listen_address.as_str(), port)).await?),
        None => None,
    };

    let unix_listener = match &state.config.unix_socket_path {
        Some(path) => {
            let _ = std::fs::remove_file(path);
            Some(UnixListener::bind(path)?)
        }
        None => None,
    };

    drop_privileges(&state.config)?;

    spawn_schedulers(&state).await?;

    // Bounds how many connection-handler tasks run at once (`max_servers`);
    // a forked daemon gets this for free from its process table, a task
    // pool needs it spelled out.
    let servers = Arc::new(Semaphore::new(state.config.max_servers));

    let mut poll = tokio::time::interval(state.config.poll_interval);
    loop {
        tokio::select! {
            accepted = accept_tcp(&tcp_listener) => {
                if let Some((stream, peer)) = accepted {
                    let state = state.clone();
                    if let Ok(permit) = servers.clone().try_acquire_owned() {
                        let span = tracing::info_span!("request-handler", transport = "tcp", %peer);
                        tokio::spawn(async move {
                            let _permit = permit;
                            if let Err(error) = handlers::handle_tcp(stream, peer, state).await {
                                tracing::warn!(%error, "connection handler failed");
                            }
                        }.instrument(span));
                    } else {
                        tracing::warn!("max_servers reached, dropping connection");
                    }
                }
            }
            accepted = accept_unix(&unix_listener) => {
                if let Some(stream) = accepted {
                    let state = state.clone();
                    if let Ok(permit) = servers.clone().try_acquire_owned() {
                        let span = tracing::info_span!("request-handler", transport = "unix");
                        tokio::spawn(async move {
                            let _permit = permit;
                            if let Err(error) = handlers::handle_unix(stream, state).await {
                                tracing::warn!(%error, "connection handler failed");
                            }
                        }.instrument(span));
                    } else {
                        tracing::warn!("max_servers reached, dropping connection");
                    }
                }
            }
            _ = poll.tick() => {
                if let Err(error) = spawn_schedulers(&state).await {
                    tracing::warn!(%error, "printcap rescan failed");
                }
            }
        }
    }
}

/// Give up root after the privileged listen ports are bound (spec §4.7
/// step 1: `daemon_user`/`daemon_group`). A no-op for non-root or when
/// neither is configured.
///
/// Spool files created before this point (the dispatcher lock, the log
/// file) stay owned by root; operators who configure `daemon_user` are
/// expected to pre-create the spool tree with that ownership.
#[cfg(unix)]
fn drop_privileges(config: &crate::config::Config) -> Result<(), DaemonError> {
    use nix::unistd::{geteuid, setgid, setuid, Group, User};

    if !geteuid().is_root() {
        return Ok(());
    }

    if let Some(group_name) = &config.daemon_group {
        let group = Group::from_name(group_name)
            .map_err(std::io::Error::from)?
            .ok_or_else(|| std::io::Error::other(format!("unknown group {group_name}")))?;
        setgid(group.gid).map_err(std::io::Error::from)?;
    }
    if let Some(user_name) = &config.daemon_user {
        let user = User::from_name(user_name)
            .map_err(std::io::Error::from)?
            .ok_or_else(|| std::io::Error::other(format!("unknown user {user_name}")))?;
        setuid(user.uid).map_err(std::io::Error::from)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn drop_privileges(_config: &crate::config::Config) -> Result<(), DaemonError> {
    Ok(())
}

async fn accept_tcp(listener: &Option<TcpListener>) -> Option<(tokio::net::TcpStream, std::net::SocketAddr)> {
    match listener {
        Some(listener) => listener.accept().await.ok(),
        None => std::future::pending().await,
    }
}

async fn accept_unix(listener: &Option<UnixListener>) -> Option<tokio::net::UnixStream> {
    match listener {
        Some(listener) => listener.accept().await.ok().map(|(stream, _)| stream),
        None => std::future::pending().await,
    }
}

/// Start a scheduler task for every printcap entry that doesn't already
/// have one running (spec §4.7 step 6).
async fn spawn_schedulers(state: &Arc<DaemonState>) -> Result<(), DaemonError> {
    let names = state.registry.read().await.queue_names();
    let mut started = 0u32;
    for name in names {
        if !state.claim_scheduler(&name).await {
            continue;
        }
        let wake = state.wake_handle(&name).await;
        wake.notify_one();
        let config = state.config.clone();
        let registry = state.registry.clone();
        let metrics = state.metrics.clone();
        let delay = config.poll_start_interval * started;
        let span = tracing::info_span!("scheduler", queue = %name);
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            scheduler::run(name, config, registry, metrics, wake).await;
        }.instrument(span));
        started += 1;
    }
    Ok(())
}
