//! Test helpers for black-box `lpd`/`lpdc` specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::Duration;

fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

fn lpdc_cmd() -> Command {
    Command::new(binary_path("lpdc"))
}

/// A running `lpd` bound to an isolated spool/state directory, with no
/// TCP listener (so parallel test runs never collide on port 515) and
/// talking only over its UNIX socket.
pub struct Daemon {
    child: Child,
    state_dir: tempfile::TempDir,
}

impl Daemon {
    /// Start `lpd` against a printcap declaring one local queue named `lp`
    /// writing to `/dev/null`, with no permission rules (open access).
    pub fn start() -> Self {
        Self::start_with_printcap("lp:lp=/dev/null:sd=/var/spool/lpd/lp:mx#0:sh")
    }

    pub fn start_with_printcap(printcap: &str) -> Self {
        Self::start_with(printcap, None, None)
    }

    /// Like [`start_with_printcap`](Self::start_with_printcap), but also
    /// drops a `lpd.toml` into the state directory and points `LPD_CONF`
    /// at it, so a test can override e.g. `max_attempts` without touching
    /// the built-in defaults.
    pub fn start_with_config(printcap: &str, toml: &str) -> Self {
        Self::start_with(printcap, Some(toml), None)
    }

    /// Like [`start_with_printcap`](Self::start_with_printcap), but binds
    /// a real loopback TCP port instead of `-p off`, so another daemon can
    /// forward a job to it. Returns the daemon together with the port it's
    /// listening on.
    pub fn start_with_tcp(printcap: &str) -> (Self, u16) {
        let port = free_tcp_port();
        (Self::start_with(printcap, None, Some(port)), port)
    }

    fn start_with(printcap: &str, toml: Option<&str>, tcp_port: Option<u16>) -> Self {
        let state_dir = tempfile::tempdir().unwrap();
        std::fs::write(state_dir.path().join("printcap"), printcap).unwrap();
        std::fs::write(state_dir.path().join("lpd.perms"), "").unwrap();

        let mut cmd = Command::new(binary_path("lpd"));
        cmd.arg("-F");
        match tcp_port {
            Some(port) => {
                cmd.arg("-p").arg(port.to_string());
            }
            None => {
                cmd.arg("-p").arg("off");
            }
        }
        cmd.env("LPD_STATE_DIR", state_dir.path())
            .env("LPD_SPOOL_ROOT", state_dir.path().join("spool"))
            .env("LPD_PRINTCAP_PATH", state_dir.path().join("printcap"))
            .env_remove("RUST_LOG")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());

        match toml {
            Some(text) => {
                let conf_path = state_dir.path().join("lpd.toml");
                std::fs::write(&conf_path, text).unwrap();
                cmd.env("LPD_CONF", &conf_path);
            }
            None => {
                cmd.env_remove("LPD_CONF");
            }
        }

        let child = cmd.spawn().expect("lpd should start");

        let socket = state_dir.path().join("lpd.sock");
        wait_for(2000, || socket.exists());

        Self { child, state_dir }
    }

    pub fn socket_path(&self) -> PathBuf {
        self.state_dir.path().join("lpd.sock")
    }

    /// Spool directory for one queue, for tests that want to assert the
    /// ticket/control/data files are actually gone once a job finishes.
    pub fn spool_dir(&self, queue: &str) -> PathBuf {
        self.state_dir.path().join("spool").join(queue)
    }

    pub fn lpdc(&self) -> Command {
        let mut cmd = lpdc_cmd();
        cmd.arg("--socket").arg(self.socket_path());
        cmd
    }
}

/// Binds `127.0.0.1:0`, reads back the port the kernel assigned, then
/// drops the listener so `lpd` can bind the same port moments later.
/// Racy against other processes in principle, fine for a test process.
fn free_tcp_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// A job to submit over the opcode `\2` receive-job wire protocol, traced
/// directly from `lpd_daemon::handlers::receive`: one control file (parsed
/// back into `(priority, number, host)` by `QueueFile::parse`, so its name
/// must follow the `cf{A-Z}{3 digits}{host}` shape) and one data file
/// (name is cosmetic, stored only as `user_filename`).
pub struct RawJob<'a> {
    pub priority: char,
    pub number: u32,
    pub host: &'a str,
    pub user: &'a str,
    pub class: &'a str,
    pub data: &'a [u8],
}

/// Submits a job to `queue` over `socket` using the same sub-opcode
/// framing `handlers::receive::receive_loop` expects: opcode byte `2`,
/// the queue name, then a control-file transfer (sub-opcode `2`) and a
/// data-file transfer (sub-opcode `3`), each as a `"{size} {name}\n"`
/// header followed by the raw bytes and a one-byte ack (`0` on success).
/// Closing the connection afterwards (no explicit `Abort` sub-opcode) is
/// enough to finalize the job, the same as a real client disconnecting.
pub fn submit_job(socket: &Path, queue: &str, job: &RawJob) {
    let mut stream = UnixStream::connect(socket).unwrap();
    stream.write_all(&[2u8]).unwrap();
    stream.write_all(format!("{queue}\n").as_bytes()).unwrap();

    let control_name = format!("cf{}{:03}{}", job.priority, job.number, job.host);
    let control_body = format!("H{}\nP{}\nC{}\nJjob\n", job.host, job.user, job.class);
    send_named_file(&mut stream, 2, &control_name, control_body.as_bytes());

    let data_name = format!("df{}{:03}{}", job.priority, job.number, job.host);
    send_named_file(&mut stream, 3, &data_name, job.data);

    drop(stream);
}

fn send_named_file(stream: &mut UnixStream, sub_opcode: u8, name: &str, bytes: &[u8]) {
    stream.write_all(&[sub_opcode]).unwrap();
    stream.write_all(format!("{} {name}\n", bytes.len()).as_bytes()).unwrap();
    stream.write_all(bytes).unwrap();
    let mut ack = [0u8; 1];
    stream.read_exact(&mut ack).unwrap();
    assert_eq!(ack[0], 0, "daemon nak'd the {name} transfer");
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Poll a condition until it returns true or the timeout elapses.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}
