//! Remove-job specs (opcode `\5`).

use crate::prelude::*;

#[test]
fn remove_with_no_matching_jobs_says_so() {
    let daemon = Daemon::start();
    let output = daemon.lpdc().args(["remove", "lp", "nobody", "-"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("no matching jobs"), "stdout was: {stdout}");
}

#[test]
fn remove_all_fans_out_over_every_queue() {
    let daemon = Daemon::start_with_printcap(
        "lp:lp=/dev/null:sd=/var/spool/lpd/lp:mx#0:sh\ndj:lp=/dev/null:sd=/var/spool/lpd/dj:mx#0:sh",
    );
    let output = daemon.lpdc().args(["remove", "all", "nobody", "-"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lp: no matching jobs"), "stdout was: {stdout}");
    assert!(stdout.contains("dj: no matching jobs"), "stdout was: {stdout}");
}
