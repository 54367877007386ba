// SPDX-License-Identifier: MIT

//! Daemon configuration (spec §6 "CLI surface", "Environment"; §9
//! "Global mutable state": configuration is an explicit, immutable-after-
//! init record, replaced wholesale on `SIGHUP`, never mutated in place).
//!
//! Defaults are layered: built-in defaults, then the TOML file at
//! [`file_path`], then a couple of environment overrides kept for
//! operator/test convenience — later layers win.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the spool tree; each queue gets a subdirectory.
    pub spool_root: PathBuf,
    /// Printcap source files, concatenated in order (spec §4.2 supports
    /// more than one `tc`-linkable source).
    pub printcap_paths: Vec<PathBuf>,
    /// Permissions rule file.
    pub permissions_path: PathBuf,
    pub listen_address: String,
    /// TCP listen port; `None` disables the TCP listener (`-p off`).
    pub tcp_port: Option<u16>,
    /// UNIX domain socket path; `None` disables it (`-P off`).
    pub unix_socket_path: Option<PathBuf>,
    /// Dispatcher's own lock/pid file, keyed by port (spec §4.7 step 2).
    pub dispatcher_lock_path: PathBuf,
    pub log_path: PathBuf,
    /// How often the dispatcher rescans printcap for queues needing a
    /// scheduler (spec §4.7 step 6 `poll_time`).
    pub poll_interval: Duration,
    /// Spreads scheduler-task startup after a rescan so a printcap with
    /// many queues doesn't take every queue lock in the same instant
    /// (`poll_start_interval`/`poll_servers_started` collapsed into one
    /// knob, see DESIGN.md).
    pub poll_start_interval: Duration,
    /// Caps the number of connection-handler tasks running at once
    /// (`max_servers`).
    pub max_servers: usize,
    /// `tc` expansion depth limit (spec §4.2).
    pub tc_depth: u32,
    pub spool_dir_perms: u32,
    pub spool_file_perms: u32,
    /// Drop to this user/group after binding privileged sockets, when
    /// running as root (spec §4.7 step 1).
    pub daemon_user: Option<String>,
    pub daemon_group: Option<String>,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Timeout for one device/forwarder write during a print pipeline run
    /// (`send_job_rw_timeout`).
    pub send_job_rw_timeout: Duration,
    pub foreground: bool,
    /// Outbound port used to forward to a remote queue when printcap gives
    /// no `rp-port` of its own (spec §6 `-R port`).
    pub outbound_port: u16,
}

/// The on-disk shape of the TOML configuration file. Every field is
/// optional; an absent field keeps the built-in default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    spool_root: Option<PathBuf>,
    printcap_paths: Option<Vec<PathBuf>>,
    permissions_path: Option<PathBuf>,
    listen_address: Option<String>,
    tcp_port: Option<u16>,
    unix_socket_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    poll_time_secs: Option<u64>,
    poll_start_interval_ms: Option<u64>,
    max_servers: Option<usize>,
    tc_depth: Option<u32>,
    spool_dir_perms: Option<u32>,
    spool_file_perms: Option<u32>,
    daemon_user: Option<String>,
    daemon_group: Option<String>,
    max_attempts: Option<u32>,
    backoff_base_secs: Option<u64>,
    backoff_max_secs: Option<u64>,
    send_job_rw_timeout_secs: Option<u64>,
    outbound_port: Option<u16>,
}

impl Config {
    /// Load configuration: built-in defaults, overlaid by the TOML file
    /// at [`file_path`] if one exists, overlaid by environment overrides.
    /// A missing file falls back to documented defaults (spec §4.11); a
    /// present-but-malformed file is a fatal startup error.
    pub fn load() -> Result<Self, std::io::Error> {
        let state_dir = state_dir()?;
        let running_as_root = is_root();

        let file = read_file_config(&file_path(running_as_root, &state_dir))?;

        let default_printcap = if running_as_root { PathBuf::from("/etc/printcap") } else { state_dir.join("printcap") };

        let mut config = Self {
            spool_root: file.spool_root.unwrap_or_else(|| state_dir.join("spool")),
            printcap_paths: file.printcap_paths.unwrap_or_else(|| vec![default_printcap]),
            permissions_path: file.permissions_path.unwrap_or_else(|| state_dir.join("lpd.perms")),
            listen_address: file.listen_address.unwrap_or_else(|| "0.0.0.0".to_string()),
            tcp_port: Some(file.tcp_port.unwrap_or(515)),
            unix_socket_path: Some(file.unix_socket_path.unwrap_or_else(|| state_dir.join("lpd.sock"))),
            dispatcher_lock_path: state_dir.join("lpd.lock"),
            log_path: file.log_path.unwrap_or_else(|| state_dir.join("lpd.log")),
            poll_interval: Duration::from_secs(file.poll_time_secs.unwrap_or(30)),
            poll_start_interval: Duration::from_millis(file.poll_start_interval_ms.unwrap_or(50)),
            max_servers: file.max_servers.unwrap_or(40),
            tc_depth: file.tc_depth.unwrap_or(8),
            spool_dir_perms: file.spool_dir_perms.unwrap_or(0o755),
            spool_file_perms: file.spool_file_perms.unwrap_or(0o644),
            daemon_user: file.daemon_user,
            daemon_group: file.daemon_group,
            max_attempts: file.max_attempts.unwrap_or(5),
            backoff_base: Duration::from_secs(file.backoff_base_secs.unwrap_or(1)),
            backoff_max: Duration::from_secs(file.backoff_max_secs.unwrap_or(60)),
            send_job_rw_timeout: Duration::from_secs(file.send_job_rw_timeout_secs.unwrap_or(300)),
            foreground: false,
            outbound_port: file.outbound_port.unwrap_or(515),
        };

        apply_env_overrides(&mut config);
        Ok(config)
    }
}

/// Resolve the TOML configuration file path: `LPD_CONF` (ignored when
/// running as root, per spec §6 "Environment"), else a per-OS default
/// under `dirs::config_dir()`, falling back to the state directory.
fn file_path(running_as_root: bool, state_dir: &std::path::Path) -> PathBuf {
    if running_as_root {
        return PathBuf::from("/etc/lpd/lpd.toml");
    }
    if let Some(path) = env_path("LPD_CONF") {
        return path;
    }
    match dirs::config_dir() {
        Some(dir) => dir.join("lpd/lpd.toml"),
        None => state_dir.join("lpd.toml"),
    }
}

fn read_file_config(path: &std::path::Path) -> Result<FileConfig, std::io::Error> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(error) => return Err(error),
    };
    toml::from_str(&text).map_err(|error| std::io::Error::other(format!("malformed config file {}: {error}", path.display())))
}

fn apply_env_overrides(config: &mut Config) {
    if let Some(path) = env_path("LPD_SPOOL_ROOT") {
        config.spool_root = path;
    }
    if let Some(path) = env_path("LPD_PRINTCAP_PATH") {
        config.printcap_paths = vec![path];
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var).map(PathBuf::from)
}

/// Resolve the daemon's state directory: `LPD_STATE_DIR` > `XDG_STATE_HOME`/lpd > `~/.local/state/lpd`.
fn state_dir() -> Result<PathBuf, std::io::Error> {
    if let Some(dir) = env_path("LPD_STATE_DIR") {
        return Ok(dir);
    }
    if let Some(xdg) = env_path("XDG_STATE_HOME") {
        return Ok(xdg.join("lpd"));
    }
    let home = env_path("HOME").or_else(dirs::home_dir).ok_or_else(|| std::io::Error::other("no home directory for the current user"))?;
    Ok(home.join(".local/state/lpd"))
}

#[cfg(unix)]
fn is_root() -> bool {
    // Safe wrapper: reads the real uid, no unsafe needed.
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}
