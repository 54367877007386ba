// SPDX-License-Identifier: MIT

//! Resolves which running `lpd` to talk to: an explicit UNIX socket or
//! TCP host/port, falling back to the same state-directory convention
//! `lpd` itself uses for its default socket (spec §6 "Environment").

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Target {
    Unix(PathBuf),
    Tcp { host: String, port: u16 },
}

impl Target {
    /// `--socket` wins over `--host`/`--port`; with neither given, prefer
    /// the default UNIX socket under the state directory and fall back to
    /// `localhost:515`.
    pub fn resolve(socket: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(path) = socket {
            return Target::Unix(path);
        }
        if host.is_some() || port.is_some() {
            return Target::Tcp { host: host.unwrap_or_else(|| "localhost".to_string()), port: port.unwrap_or(515) };
        }
        match default_socket_path() {
            Some(path) if path.exists() => Target::Unix(path),
            _ => Target::Tcp { host: "localhost".to_string(), port: 515 },
        }
    }
}

fn default_socket_path() -> Option<PathBuf> {
    state_dir().map(|dir| dir.join("lpd.sock"))
}

fn state_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("LPD_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Some(xdg) = std::env::var_os("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("lpd"));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/state/lpd"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_socket_wins_over_host_and_port() {
        let target = Target::resolve(Some(PathBuf::from("/tmp/custom.sock")), Some("otherhost".to_string()), Some(9100));
        match target {
            Target::Unix(path) => assert_eq!(path, PathBuf::from("/tmp/custom.sock")),
            Target::Tcp { .. } => panic!("expected a UNIX target"),
        }
    }

    #[test]
    fn host_without_socket_resolves_to_tcp() {
        let target = Target::resolve(None, Some("printhost".to_string()), None);
        match target {
            Target::Tcp { host, port } => {
                assert_eq!(host, "printhost");
                assert_eq!(port, 515);
            }
            Target::Unix(_) => panic!("expected a TCP target"),
        }
    }
}
