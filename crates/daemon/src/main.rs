// SPDX-License-Identifier: MIT

//! lpd: the line-printer spooling daemon binary (spec §4.7 "Startup",
//! §6 "CLI surface of the server binary").

use clap::{CommandFactory, FromArgMatches, Parser};
use lpd_core::HostInfo;
use lpd_daemon::{Config, DaemonState, Registry};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "lpd", version, about = "line-printer spooling daemon", disable_version_flag = true)]
struct Cli {
    /// Debug level, optionally followed by comma-separated flags (maps to `RUST_LOG`).
    #[arg(short = 'D', value_name = "level[,flag]*")]
    debug: Option<String>,

    /// Stay attached to the controlling terminal and log to stderr too.
    #[arg(short = 'F')]
    foreground: bool,

    /// Override the log file path.
    #[arg(short = 'L', value_name = "logfile")]
    log_file: Option<PathBuf>,

    /// TCP listen port, or `off` to disable.
    #[arg(short = 'p', value_name = "port", value_parser = parse_port_or_off)]
    tcp_port: Option<PortSetting>,

    /// UNIX socket path, or `off` to disable.
    #[arg(short = 'P', value_name = "path", value_parser = parse_path_or_off)]
    unix_socket: Option<PathSetting>,

    /// Outbound port used when forwarding to a remote queue with no
    /// printcap-specified port.
    #[arg(short = 'R', value_name = "port")]
    outbound_port: Option<u16>,
}

#[derive(Clone)]
enum PortSetting {
    Off,
    Port(u16),
}

#[derive(Clone)]
enum PathSetting {
    Off,
    Path(PathBuf),
}

fn parse_port_or_off(value: &str) -> Result<PortSetting, String> {
    if value.eq_ignore_ascii_case("off") {
        return Ok(PortSetting::Off);
    }
    value.parse::<u16>().map(PortSetting::Port).map_err(|e| e.to_string())
}

fn parse_path_or_off(value: &str) -> Result<PathSetting, String> {
    if value.eq_ignore_ascii_case("off") {
        return Ok(PathSetting::Off);
    }
    Ok(PathSetting::Path(PathBuf::from(value)))
}

/// `-V`/`--version` added onto the derived command rather than through a
/// unit-typed derive field, so it can share `ArgAction::Version`'s
/// process-exiting behavior directly.
fn cli_command() -> clap::Command {
    Cli::command().arg(clap::Arg::new("version").short('V').long("version").action(clap::ArgAction::Version).help("Print version"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli_command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    let mut config = Config::load()?;
    config.foreground = cli.foreground;

    if let Some(level) = &cli.debug {
        if std::env::var_os("RUST_LOG").is_none() {
            std::env::set_var("RUST_LOG", level);
        }
    }
    if let Some(log_file) = cli.log_file {
        config.log_path = log_file;
    }
    match cli.tcp_port {
        Some(PortSetting::Off) => config.tcp_port = None,
        Some(PortSetting::Port(port)) => config.tcp_port = Some(port),
        None => {}
    }
    match cli.unix_socket {
        Some(PathSetting::Off) => config.unix_socket_path = None,
        Some(PathSetting::Path(path)) => config.unix_socket_path = Some(path),
        None => {}
    }
    if let Some(port) = cli.outbound_port {
        config.outbound_port = port;
    }

    let _log_guard = lpd_daemon::logging::init(&config)?;

    let lock = lpd_storage::QueueLock::acquire(&config.dispatcher_lock_path)
        .map_err(|_| lpd_daemon::DaemonError::AlreadyRunning(config.dispatcher_lock_path.clone()))?;

    let local_host = local_host_info();
    let registry = Registry::load(&config, local_host)?;
    let state = DaemonState::new(Arc::new(config), registry);

    tracing::info!("lpd starting");
    run_with_reload(state).await?;

    drop(lock);
    Ok(())
}

async fn run_with_reload(state: Arc<DaemonState>) -> std::io::Result<()> {
    let mut hangup = signal(SignalKind::hangup())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;
    let mut wake_all = signal(SignalKind::user_defined2())?;

    let dispatch = lpd_daemon::dispatcher::run(state.clone());
    tokio::pin!(dispatch);

    loop {
        tokio::select! {
            result = &mut dispatch => {
                if let Err(error) = result {
                    tracing::error!(%error, "dispatcher exited");
                }
                return Ok(());
            }
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, reloading printcap and permissions");
                match Registry::load(&state.config, local_host_info()) {
                    Ok(registry) => *state.registry.write().await = registry,
                    Err(error) => tracing::error!(%error, "reload failed, keeping previous configuration"),
                }
            }
            _ = wake_all.recv() => {
                tracing::debug!("SIGUSR2 received, waking every queue's scheduler");
                for queue in state.registry.read().await.queue_names() {
                    state.wake_queue(&queue).await;
                }
            }
            _ = interrupt.recv() => {
                tracing::info!("SIGINT received, shutting down");
                return Ok(());
            }
            _ = terminate.recv() => {
                tracing::info!("SIGTERM received, shutting down");
                return Ok(());
            }
            _ = quit.recv() => {
                tracing::info!("SIGQUIT received, shutting down");
                return Ok(());
            }
        }
    }
}

/// DNS/host resolution is out of scope (spec §1); this reports only the
/// local machine's own name and loopback address.
fn local_host_info() -> HostInfo {
    let hostname = nix::unistd::gethostname()
        .ok()
        .and_then(|os| os.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string());
    HostInfo::new(hostname, vec![IpAddr::from([127, 0, 0, 1])])
}
