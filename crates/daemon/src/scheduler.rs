// SPDX-License-Identifier: MIT

//! Per-queue scheduler loop (spec §4.6). One task per queue, woken by the
//! `print jobs` opcode or a job landing in its spool directory; it holds
//! the queue's advisory lock only while draining printable jobs, then
//! releases it and waits for the next wake — the tokio-task analogue of
//! "one process per active queue" (see [`crate`] module docs for why a
//! task stands in for a forked process here).

use crate::config::Config;
use crate::metrics::Counters;
use crate::registry::{Destination, QueueSettings, Registry};
use lpd_adapters::{
    AppendFileStatusSink, DeviceWriter, DualStatusSink, EnvelopeOrigin, LocalDevice, RemoteForwarder, RemoteTarget, SecureParams, TcpForwarder, Traced,
    TracingStatusSink,
};
use lpd_core::{Clock, JobOutcome, JobOutcomeBucket, JobTicket, QueueFile, SystemClock};
use lpd_engine::{printable_tickets, Backoff, DataFileSpec, PipelineConfig, PrintPipeline};
use lpd_filter::{ExpansionFields, FilterEnvironment};
use lpd_storage::{QueueLock, SpoolControl, TicketStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};

/// Runs forever, draining `queue` every time it is woken.
pub async fn run(queue: String, config: Arc<Config>, registry: Arc<RwLock<Registry>>, metrics: Arc<Counters>, wake: Arc<Notify>) {
    let backoff = Backoff::new(config.backoff_base, config.backoff_max);
    loop {
        if let Err(error) = drain_once(&queue, &config, &registry, &metrics, &backoff).await {
            tracing::error!(queue, %error, "scheduler pass failed");
        }
        wake.notified().await;
    }
}

async fn drain_once(queue: &str, config: &Config, registry: &RwLock<Registry>, metrics: &Counters, backoff: &Backoff) -> Result<(), crate::error::DaemonError> {
    let settings = registry.read().await.resolve(queue)?;
    settings.layout.ensure_exists(config.spool_dir_perms)?;

    let lock = match QueueLock::acquire(&settings.layout.lock_path()) {
        Ok(lock) => lock,
        Err(_) => {
            tracing::debug!(queue, "another scheduler already holds this queue's lock");
            return Ok(());
        }
    };

    let store = TicketStore::new(settings.layout.clone());
    loop {
        let control = SpoolControl::load(&settings.layout.control_path())?;
        if control.printing_disabled || control.aborted {
            tracing::debug!(queue, "printing disabled, scheduler sleeping");
            break;
        }

        let tickets = store.scan()?;
        let Some(head) = printable_tickets(&tickets, &control).into_iter().next().cloned() else {
            break;
        };

        print_one(&settings, &store, head, config.max_attempts, config.send_job_rw_timeout, metrics, backoff).await?;
    }

    drop(lock);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn print_one(
    settings: &QueueSettings,
    store: &TicketStore,
    mut ticket: JobTicket,
    max_attempts: u32,
    rw_timeout: Duration,
    metrics: &Counters,
    backoff: &Backoff,
) -> Result<(), crate::error::DaemonError> {
    let outcome = run_pipeline(settings, &ticket, rw_timeout).await;
    ticket.attempt += 1;
    let bucket = lpd_engine::classify(outcome, ticket.attempt, max_attempts);

    match bucket {
        JobOutcomeBucket::Success => {
            tracing::info!(job = ticket.identifier, "job printed");
            metrics.record_printed();
            store.remove(&ticket)?;
        }
        JobOutcomeBucket::Retry => {
            let delay = backoff.delay_for(ticket.attempt);
            tracing::warn!(job = ticket.identifier, attempt = ticket.attempt, delay_ms = delay.as_millis() as u64, "retrying job");
            store.write(&ticket)?;
            tokio::time::sleep(delay).await;
        }
        JobOutcomeBucket::Abort => {
            ticket.error = Some(format!("{outcome:?}"));
            ticket.error_time = Some(SystemClock.epoch_ms());
            tracing::error!(job = ticket.identifier, "job aborted, left for operator");
            metrics.record_aborted();
            store.write(&ticket)?;
        }
        JobOutcomeBucket::Hold => {
            ticket.hold_time = SystemClock.epoch_ms();
            tracing::warn!(job = ticket.identifier, "job held");
            store.write(&ticket)?;
        }
        JobOutcomeBucket::Remove => {
            tracing::info!(job = ticket.identifier, "job removed");
            store.remove(&ticket)?;
        }
    }
    Ok(())
}

async fn run_pipeline(settings: &QueueSettings, ticket: &JobTicket, rw_timeout: Duration) -> JobOutcome {
    match tokio::time::timeout(rw_timeout, run_pipeline_inner(settings, ticket)).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(error)) => {
            tracing::error!(job = ticket.identifier, %error, "print pipeline failed");
            JobOutcome::Fail
        }
        Err(_) => {
            tracing::error!(job = ticket.identifier, timeout_secs = rw_timeout.as_secs(), "print pipeline timed out");
            JobOutcome::Fail
        }
    }
}

async fn run_pipeline_inner(settings: &QueueSettings, ticket: &JobTicket) -> Result<JobOutcome, crate::error::DaemonError> {
    let Some(destination) = &settings.destination else {
        return Ok(JobOutcome::NoPrint);
    };

    let mut data_files = Vec::with_capacity(ticket.data_files.len());
    for df in &ticket.data_files {
        let open_name = df.open_name.clone();
        let bytes = tokio::task::spawn_blocking(move || std::fs::read(&open_name).unwrap_or_default()).await.unwrap_or_default();
        data_files.push(DataFileSpec { bytes, format_filter: settings.if_filter.clone(), copies: df.copies });
    }

    let pipeline_config = PipelineConfig {
        suppress_header: settings.suppress_header,
        banner_last: settings.banner_last,
        ff_separator: settings.ff_separator,
        of_filter: settings.of_filter.clone(),
        ..Default::default()
    };

    let env = FilterEnvironment {
        printer: settings.name.clone(),
        logname: ticket.logname.clone(),
        ..Default::default()
    };

    let outcome = match destination {
        Destination::Local { device_path } => {
            let device = Traced::new(LocalDevice::open(device_path).await?);
            let status_sink = DualStatusSink::new(AppendFileStatusSink::new(settings.layout.status_path()), TracingStatusSink);
            let pipeline = PrintPipeline::new(device, status_sink, env);
            pipeline.run(&pipeline_config, &data_files, |index| fields_for(ticket, index)).await?
        }
        Destination::Remote { host, port, queue } => {
            let forwarder = Traced::new(TcpForwarder::new(Duration::from_secs(10)));
            let target = RemoteTarget { host: host.clone(), port: *port };
            let secure = settings.requires_auth.then(|| SecureParams {
                origin: EnvelopeOrigin::Forwarded,
                user: ticket.logname.clone(),
                auth_type: settings.auth_type.clone(),
            });
            forward(&forwarder, &target, queue, ticket, secure.as_ref()).await?
        }
    };
    Ok(outcome)
}

async fn forward(
    forwarder: &impl RemoteForwarder,
    target: &lpd_adapters::RemoteTarget,
    queue: &str,
    ticket: &JobTicket,
    secure: Option<&SecureParams>,
) -> Result<JobOutcome, crate::error::DaemonError> {
    // The receiving end only learns a job's (priority, number, host) by
    // running `QueueFile::parse` on this control filename (see
    // `handlers/receive.rs`'s `control_identity`); a name built from
    // `ticket.identifier` (`"{host}-{number}"`) doesn't match that shape and
    // left every forwarded job silently discarded, so this mirrors the same
    // `cf{priority}{number:03}{host}` convention `QueueFile::filename` uses
    // for a locally spooled control file.
    let control_name = QueueFile::control_file(ticket.priority.0, ticket.number, ticket.hostname.clone()).filename();
    let control = lpd_adapters::NamedFile { name: control_name, bytes: ticket.to_linelist().join("\n").into_bytes() };
    let mut data_files = Vec::with_capacity(ticket.data_files.len());
    for df in &ticket.data_files {
        let open_name = df.open_name.clone();
        let bytes = tokio::task::spawn_blocking(move || std::fs::read(&open_name).unwrap_or_default()).await.unwrap_or_default();
        data_files.push(lpd_adapters::NamedFile { name: df.transfer_name.clone(), bytes });
    }
    let envelope = lpd_adapters::Envelope { control, data_files };
    forwarder.send_job(target, queue, &envelope, secure).await?;
    Ok(JobOutcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpd_core::{JobTicketConfig, Priority};
    use std::time::Duration as StdDuration;

    fn settings(dir: &std::path::Path, destination: Option<Destination>) -> QueueSettings {
        QueueSettings {
            name: "lp".to_string(),
            layout: lpd_storage::SpoolLayout::new(dir, "lp"),
            destination,
            of_filter: None,
            if_filter: None,
            suppress_header: true,
            banner_last: false,
            ff_separator: true,
            requires_auth: false,
            auth_type: "default".to_string(),
        }
    }

    fn ticket(number: u32, data: &[u8], data_dir: &std::path::Path) -> JobTicket {
        let data_path = data_dir.join(format!("dfA{number:03}host1"));
        std::fs::write(&data_path, data).unwrap();
        let mut t = JobTicket::new(JobTicketConfig {
            identifier: format!("host1-{number}"),
            number,
            hostname: "host1".to_string(),
            priority: Priority('A'),
            class: None,
            logname: "alice".to_string(),
            from_host: "host1".to_string(),
            auth_user: None,
        });
        t.data_files.push(lpd_core::DataFile::new(data_path, "report".to_string(), 'f', data.len() as u64));
        t
    }

    fn fast_backoff() -> Backoff {
        Backoff::new(StdDuration::from_millis(1), StdDuration::from_millis(1))
    }

    #[tokio::test]
    async fn successful_print_removes_the_ticket() {
        let dir = tempfile::tempdir().unwrap();
        let spool = dir.path().join("spool");
        let device = spool.join("device-out");
        let settings = settings(&spool, Some(Destination::Local { device_path: device.clone() }));
        settings.layout.ensure_exists(0o755).unwrap();
        std::fs::write(&device, b"").unwrap();

        let store = TicketStore::new(settings.layout.clone());
        let job = ticket(1, b"abc", &spool);
        store.write(&job).unwrap();
        let metrics = Counters::default();

        print_one(&settings, &store, job, 5, StdDuration::from_secs(5), &metrics, &fast_backoff()).await.unwrap();

        assert!(store.read('A', 1, "host1").unwrap().is_none());
        assert_eq!(metrics.snapshot(0).jobs_printed, 1);
    }

    #[tokio::test]
    async fn failing_device_retries_below_the_attempt_cap() {
        let dir = tempfile::tempdir().unwrap();
        let spool = dir.path().join("spool");
        let settings = settings(&spool, Some(Destination::Local { device_path: spool.join("no-such-device") }));
        settings.layout.ensure_exists(0o755).unwrap();

        let store = TicketStore::new(settings.layout.clone());
        let job = ticket(2, b"abc", &spool);
        store.write(&job).unwrap();
        let metrics = Counters::default();

        print_one(&settings, &store, job, 5, StdDuration::from_secs(5), &metrics, &fast_backoff()).await.unwrap();

        let remaining = store.read('A', 2, "host1").unwrap().expect("ticket kept for retry");
        assert_eq!(remaining.attempt, 1);
        assert!(remaining.error.is_none());
    }

    #[tokio::test]
    async fn failing_device_aborts_once_over_the_attempt_cap() {
        let dir = tempfile::tempdir().unwrap();
        let spool = dir.path().join("spool");
        let settings = settings(&spool, Some(Destination::Local { device_path: spool.join("no-such-device") }));
        settings.layout.ensure_exists(0o755).unwrap();

        let store = TicketStore::new(settings.layout.clone());
        let job = ticket(3, b"abc", &spool);
        store.write(&job).unwrap();
        let metrics = Counters::default();

        print_one(&settings, &store, job, 1, StdDuration::from_secs(5), &metrics, &fast_backoff()).await.unwrap();
        let retried = store.read('A', 3, "host1").unwrap().expect("ticket kept after first failure");
        assert_eq!(retried.attempt, 1);

        print_one(&settings, &store, retried, 1, StdDuration::from_secs(5), &metrics, &fast_backoff()).await.unwrap();
        let aborted = store.read('A', 3, "host1").unwrap().expect("ticket kept after abort, for the operator");
        assert_eq!(aborted.attempt, 2);
        assert!(aborted.error.is_some());
        assert_eq!(metrics.snapshot(0).jobs_aborted, 1);
    }

    #[tokio::test]
    async fn queue_with_no_destination_holds_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let spool = dir.path().join("spool");
        let settings = settings(&spool, None);
        settings.layout.ensure_exists(0o755).unwrap();

        let store = TicketStore::new(settings.layout.clone());
        let job = ticket(4, b"abc", &spool);
        store.write(&job).unwrap();
        let metrics = Counters::default();

        print_one(&settings, &store, job, 5, StdDuration::from_secs(5), &metrics, &fast_backoff()).await.unwrap();

        let held = store.read('A', 4, "host1").unwrap().expect("held jobs stay in the spool");
        assert!(held.is_held());
    }
}

fn fields_for(ticket: &JobTicket, index: usize) -> ExpansionFields {
    let data_file = ticket.data_files.get(index);
    ExpansionFields {
        printer: String::new(),
        host: ticket.hostname.clone(),
        job_number: ticket.number.to_string(),
        logname: ticket.logname.clone(),
        user_filename: data_file.map(|f| f.user_filename.clone()).unwrap_or_default(),
        format: data_file.map(|f| f.format.to_string()).unwrap_or_default(),
        size: data_file.map(|f| f.size.to_string()).unwrap_or_default(),
        time: String::new(),
        flags: String::new(),
        named: Default::default(),
    }
}
