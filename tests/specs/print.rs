//! End-to-end job specs: submit a job over the receive-job wire protocol
//! and drive it through a real scheduler/print pipeline.

use crate::prelude::*;
use std::time::Duration;

fn alice_job(number: u32, data: &'static [u8]) -> RawJob<'static> {
    RawJob { priority: 'A', number, host: "h1", user: "alice", class: "", data }
}

#[test]
fn happy_path_prints_and_clears_the_spool() {
    let daemon = Daemon::start_with_printcap("lp:lp=/dev/null:sd=/var/spool/lpd/lp:mx#0:sh");

    submit_job(&daemon.socket_path(), "lp", &alice_job(1, b"abc"));

    let cleared = wait_for(3000, || {
        let output = daemon.lpdc().args(["status", "lp"]).output().unwrap();
        String::from_utf8_lossy(&output.stdout).contains("no entries")
    });
    assert!(cleared, "job was never printed and cleared from the queue");

    let spool = daemon.spool_dir("lp");
    let leftover = std::fs::read_dir(&spool)
        .map(|entries| entries.filter_map(|e| e.ok()).any(|e| e.file_name().to_string_lossy().starts_with("hf")))
        .unwrap_or(false);
    assert!(!leftover, "a job ticket file was left behind in the spool directory");
}

#[test]
fn a_job_that_never_prints_ends_up_aborted_with_an_error() {
    let spool = tempfile::tempdir().unwrap();
    let printcap = format!("lp:lp={}/nonexistent-device:sd={}/lp:mx#0:sh", spool.path().display(), spool.path().display());
    let daemon = Daemon::start_with_config(&printcap, "max_attempts = 1\nbackoff_base_secs = 0\nbackoff_max_secs = 0\n");

    submit_job(&daemon.socket_path(), "lp", &alice_job(1, b"abc"));

    let aborted = wait_for(3000, || {
        let output = daemon.lpdc().args(["status", "-l", "lp"]).output().unwrap();
        String::from_utf8_lossy(&output.stdout).contains("error:")
    });
    assert!(aborted, "job never reached an aborted state with a recorded error");
}

#[test]
fn remove_by_owning_user_succeeds_and_by_another_user_is_rejected() {
    let daemon = Daemon::start_with_printcap("lp:sd=/var/spool/lpd/lp:mx#0:sh");

    submit_job(&daemon.socket_path(), "lp", &alice_job(1, b"abc"));
    wait_for(1000, || {
        let output = daemon.lpdc().args(["status", "lp"]).output().unwrap();
        !String::from_utf8_lossy(&output.stdout).contains("no entries")
    });

    let rejected = daemon.lpdc().args(["remove", "lp", "bob", "-"]).output().unwrap();
    let rejected_text = String::from_utf8_lossy(&rejected.stdout);
    assert!(rejected_text.contains("no matching jobs"), "stdout was: {rejected_text}");

    let still_there = daemon.lpdc().args(["status", "lp"]).output().unwrap();
    assert!(!String::from_utf8_lossy(&still_there.stdout).contains("no entries"));

    let accepted = daemon.lpdc().args(["remove", "lp", "alice", "-"]).output().unwrap();
    let accepted_text = String::from_utf8_lossy(&accepted.stdout);
    assert!(accepted_text.contains("removed"), "stdout was: {accepted_text}");

    let gone = daemon.lpdc().args(["status", "lp"]).output().unwrap();
    assert!(String::from_utf8_lossy(&gone.stdout).contains("no entries"));
}

#[test]
fn held_job_is_skipped_until_released() {
    let daemon = Daemon::start_with_printcap("lp:lp=/dev/null:sd=/var/spool/lpd/lp:mx#0:sh");

    let disable = daemon.lpdc().args(["control", "disable", "lp"]).output().unwrap();
    assert!(disable.status.success());

    submit_job(&daemon.socket_path(), "lp", &alice_job(7, b"abc"));
    wait_for(1000, || {
        let output = daemon.lpdc().args(["status", "lp"]).output().unwrap();
        !String::from_utf8_lossy(&output.stdout).contains("no entries")
    });

    let hold = daemon.lpdc().args(["control", "hold", "lp", "7"]).output().unwrap();
    assert!(String::from_utf8_lossy(&hold.stdout).contains("1 job(s) holdd"), "stdout was: {}", String::from_utf8_lossy(&hold.stdout));

    let enable = daemon.lpdc().args(["control", "enable", "lp"]).output().unwrap();
    assert!(enable.status.success());

    std::thread::sleep(Duration::from_millis(300));
    let status = daemon.lpdc().args(["status", "lp"]).output().unwrap();
    assert!(!String::from_utf8_lossy(&status.stdout).contains("no entries"), "held job was printed despite never being released");

    let release = daemon.lpdc().args(["control", "release", "lp", "7"]).output().unwrap();
    assert!(String::from_utf8_lossy(&release.stdout).contains("1 job(s) released"), "stdout was: {}", String::from_utf8_lossy(&release.stdout));

    let cleared = wait_for(3000, || {
        let output = daemon.lpdc().args(["status", "lp"]).output().unwrap();
        String::from_utf8_lossy(&output.stdout).contains("no entries")
    });
    assert!(cleared, "job was never printed after being released");
}

#[test]
fn forwarded_job_arrives_intact_on_the_destination_queue() {
    let (downstream, downstream_port) = Daemon::start_with_tcp("q2:sd=/var/spool/lpd/q2:mx#0:sh");
    let upstream_printcap = format!("lp:rm=127.0.0.1:rp=q2:rp-port={downstream_port}:sd=/var/spool/lpd/lp:mx#0:sh");
    let upstream = Daemon::start_with_printcap(&upstream_printcap);

    let payload = b"forward me";
    submit_job(&upstream.socket_path(), "lp", &alice_job(1, payload));

    let forwarded_out = wait_for(4000, || {
        let output = upstream.lpdc().args(["status", "lp"]).output().unwrap();
        String::from_utf8_lossy(&output.stdout).contains("no entries")
    });
    assert!(forwarded_out, "job never left the source queue");

    let arrived = wait_for(4000, || {
        let output = downstream.lpdc().args(["status", "q2"]).output().unwrap();
        !String::from_utf8_lossy(&output.stdout).contains("no entries")
    });
    assert!(arrived, "job never appeared on the destination queue");

    let spool = downstream.spool_dir("q2");
    let data_bytes = std::fs::read_dir(&spool)
        .unwrap()
        .filter_map(|e| e.ok())
        .find(|e| e.file_name().to_string_lossy().starts_with("df"))
        .map(|e| std::fs::read(e.path()).unwrap());
    assert_eq!(data_bytes.as_deref(), Some(payload.as_slice()), "forwarded data bytes did not match the original job");
}
