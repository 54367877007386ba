//! Status query specs (opcode `\3`/`\4`).

use crate::prelude::*;

#[test]
fn status_for_unknown_queue_says_so() {
    let daemon = Daemon::start();
    let output = daemon.lpdc().args(["status", "nosuchqueue"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("nosuchqueue"), "stdout was: {stdout}");
}

#[test]
fn long_status_flag_is_accepted() {
    let daemon = Daemon::start();
    let output = daemon.lpdc().args(["status", "-l", "lp"]).output().unwrap();
    assert!(output.status.success());
}
