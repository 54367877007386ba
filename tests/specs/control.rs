//! LPC administrative command specs (opcode `\7`).

use crate::prelude::*;

#[test]
fn disable_then_enable_round_trips_through_status() {
    let daemon = Daemon::start();

    let disable = daemon.lpdc().args(["control", "disable", "lp"]).output().unwrap();
    assert!(disable.status.success());
    assert!(String::from_utf8_lossy(&disable.stdout).contains("printing disabled"));

    let status = daemon.lpdc().args(["status", "lp"]).output().unwrap();
    assert!(String::from_utf8_lossy(&status.stdout).contains("printing is disabled"));

    let enable = daemon.lpdc().args(["control", "enable", "lp"]).output().unwrap();
    assert!(String::from_utf8_lossy(&enable.stdout).contains("printing enabled"));
}

#[test]
fn unknown_command_reports_itself_instead_of_failing() {
    let daemon = Daemon::start();
    let output = daemon.lpdc().args(["control", "frobnicate", "lp"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("unknown LPC command"));
}
