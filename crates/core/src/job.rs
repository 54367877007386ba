// SPDX-License-Identifier: MIT

//! Job ticket: one job's durable state (spec §3 "Job ticket").
//!
//! A [`JobTicket`] is a typed view over the fields a [`LineList`] would hold
//! on disk (spec §6: "Job ticket is a text file of `key=value` lines"). This
//! module is pure data + (de)serialization to/from [`LineList`] text; actual
//! file I/O (atomic write-then-rename, spool directory scanning) lives in
//! `lpd-storage`.

use crate::linelist::LineList;
use std::path::PathBuf;

/// Job priority: a single letter `A`-`Z`, lexicographically lower = more
/// urgent (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub char);

impl Priority {
    pub const DEFAULT: Priority = Priority('A');

    pub fn new(c: char) -> Option<Self> {
        c.is_ascii_uppercase().then_some(Priority(c))
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One data file attached to a job (spec §3 "Data files").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    /// Path in the spool directory.
    pub open_name: PathBuf,
    /// Name presented to filters/clients.
    pub transfer_name: String,
    /// Single-letter format code (e.g. `f` = text, `l` = already formatted).
    pub format: char,
    pub copies: u32,
    pub size: u64,
    /// User-supplied filename, the `N` job-ticket field.
    pub user_filename: String,
}

impl DataFile {
    pub fn new(
        open_name: impl Into<PathBuf>,
        transfer_name: impl Into<String>,
        format: char,
        size: u64,
    ) -> Self {
        Self {
            open_name: open_name.into(),
            transfer_name: transfer_name.into(),
            format,
            copies: 1,
            size,
            user_filename: String::new(),
        }
    }

    fn to_linelist(&self) -> LineList {
        let mut list = LineList::new();
        list.set_str("open-name", &self.open_name.display().to_string());
        list.set_str("transfer-name", &self.transfer_name);
        list.set_str("format", &self.format.to_string());
        list.set_int("copies", self.copies as i64);
        list.set_int("size", self.size as i64);
        list.set_str("N", &self.user_filename);
        list
    }

    fn from_linelist(list: &LineList) -> Option<Self> {
        Some(Self {
            open_name: PathBuf::from(list.find_str("open-name")?),
            transfer_name: list.find_str("transfer-name")?.to_string(),
            format: list.find_str("format")?.chars().next()?,
            copies: list.find_int("copies").unwrap_or(1) as u32,
            size: list.find_int("size").unwrap_or(0) as u64,
            user_filename: list.find_str("N").unwrap_or_default().to_string(),
        })
    }
}

/// Mirror of a job's forwarding state for one additional destination (spec
/// §3 "Destinations").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub queue: String,
    pub host: Option<String>,
    pub done: bool,
    pub error: Option<String>,
}

/// Configuration for creating a new job ticket (spec §4.8 `receive-job`).
#[derive(Debug, Clone)]
pub struct JobTicketConfig {
    pub identifier: String,
    pub number: u32,
    pub hostname: String,
    pub priority: Priority,
    pub class: Option<String>,
    pub logname: String,
    pub from_host: String,
    pub auth_user: Option<String>,
}

/// A job's durable on-disk state (spec §3 "Job ticket").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTicket {
    pub identifier: String,
    pub number: u32,
    pub hostname: String,
    pub priority: Priority,
    pub class: Option<String>,
    pub logname: String,
    pub from_host: String,
    pub auth_user: Option<String>,

    /// Epoch ms; 0 = not held (spec invariant 4).
    pub hold_time: u64,
    /// Epoch ms; 0 = not marked for removal (spec invariant 4).
    pub remove_time: u64,
    /// Target queue name if this job is being forwarded (spec §3 "Control").
    pub move_to: Option<String>,
    pub done_time: Option<u64>,
    pub error: Option<String>,
    pub error_time: Option<u64>,
    pub attempt: u32,
    /// PID of the active printer worker for this job, if any.
    pub server_pid: Option<u32>,

    pub data_files: Vec<DataFile>,
    pub destinations: Vec<Destination>,
}

impl JobTicket {
    pub fn new(config: JobTicketConfig) -> Self {
        Self {
            identifier: config.identifier,
            number: config.number,
            hostname: config.hostname,
            priority: config.priority,
            class: config.class,
            logname: config.logname,
            from_host: config.from_host,
            auth_user: config.auth_user,
            hold_time: 0,
            remove_time: 0,
            move_to: None,
            done_time: None,
            error: None,
            error_time: None,
            attempt: 0,
            server_pid: None,
            data_files: Vec::new(),
            destinations: Vec::new(),
        }
    }

    pub fn is_held(&self) -> bool {
        self.hold_time != 0
    }

    pub fn is_removed(&self) -> bool {
        self.remove_time != 0
    }

    /// Spec invariant 4: held jobs stay schedulable-invisible but status-visible;
    /// removed jobs are invisible to scheduling too, until physically deleted.
    pub fn schedulable(&self) -> bool {
        !self.is_held() && !self.is_removed() && self.move_to.is_none()
    }

    pub fn total_size(&self) -> u64 {
        self.data_files.iter().map(|f| f.size * f.copies as u64).sum()
    }

    /// Serialize to the `key=value` LineList text format (spec §6).
    pub fn to_linelist(&self) -> LineList {
        let mut list = LineList::new();
        list.set_str("identifier", &self.identifier);
        list.set_int("number", self.number as i64);
        list.set_str("hostname", &self.hostname);
        list.set_str("priority", &self.priority.0.to_string());
        if let Some(class) = &self.class {
            list.set_str("class", class);
        }
        list.set_str("logname", &self.logname);
        list.set_str("from-host", &self.from_host);
        if let Some(auth) = &self.auth_user {
            list.set_str("auth-user", auth);
        }
        list.set_int("hold-time", self.hold_time as i64);
        list.set_int("remove-time", self.remove_time as i64);
        if let Some(mv) = &self.move_to {
            list.set_str("move", mv);
        }
        if let Some(t) = self.done_time {
            list.set_int("done-time", t as i64);
        }
        if let Some(err) = &self.error {
            list.set_str("error", err);
        }
        if let Some(t) = self.error_time {
            list.set_int("error-time", t as i64);
        }
        list.set_int("attempt", self.attempt as i64);
        if let Some(pid) = self.server_pid {
            list.set_int("server", pid as i64);
        }
        for df in &self.data_files {
            list.append("DATAFILE=");
            for line in df.to_linelist().iter() {
                list.append(format!("\t{line}"));
            }
        }
        for dest in &self.destinations {
            list.append("DESTINATION=");
            list.append(format!("\tqueue={}", dest.queue));
            if let Some(h) = &dest.host {
                list.append(format!("\thost={h}"));
            }
            list.append(format!("\tdone={}", dest.done));
            if let Some(e) = &dest.error {
                list.append(format!("\terror={e}"));
            }
        }
        list
    }

    /// Parse back from the `key=value` LineList text format. Returns `None`
    /// if required identity fields are missing (spec invariant 3: readers
    /// tolerate partial absence by treating the job as gone, which callers
    /// implement by mapping `None` here to "job gone").
    pub fn from_linelist(list: &LineList) -> Option<Self> {
        let mut data_files = Vec::new();
        let mut destinations = Vec::new();
        let mut current_block: Option<(&str, LineList)> = None;

        let flush = |block: &mut Option<(&str, LineList)>,
                     data_files: &mut Vec<DataFile>,
                     destinations: &mut Vec<Destination>| {
            if let Some((kind, sub)) = block.take() {
                match kind {
                    "DATAFILE" => {
                        if let Some(df) = DataFile::from_linelist(&sub) {
                            data_files.push(df);
                        }
                    }
                    "DESTINATION" => {
                        destinations.push(Destination {
                            queue: sub.find_str("queue").unwrap_or_default().to_string(),
                            host: sub.find_str("host").map(str::to_string),
                            done: sub.find_str("done") == Some("true"),
                            error: sub.find_str("error").map(str::to_string),
                        });
                    }
                    _ => {}
                }
            }
        };

        for line in list.iter() {
            if let Some(rest) = line.strip_prefix('\t') {
                if let Some((_, sub)) = current_block.as_mut() {
                    sub.append(rest);
                }
                continue;
            }
            flush(&mut current_block, &mut data_files, &mut destinations);
            if line == "DATAFILE=" {
                current_block = Some(("DATAFILE", LineList::new()));
            } else if line == "DESTINATION=" {
                current_block = Some(("DESTINATION", LineList::new()));
            }
        }
        flush(&mut current_block, &mut data_files, &mut destinations);

        Some(Self {
            identifier: list.find_str("identifier")?.to_string(),
            number: list.find_int("number")? as u32,
            hostname: list.find_str("hostname")?.to_string(),
            priority: Priority::new(list.find_str("priority")?.chars().next()?)?,
            class: list.find_str("class").map(str::to_string),
            logname: list.find_str("logname")?.to_string(),
            from_host: list.find_str("from-host")?.to_string(),
            auth_user: list.find_str("auth-user").map(str::to_string),
            hold_time: list.find_int("hold-time").unwrap_or(0) as u64,
            remove_time: list.find_int("remove-time").unwrap_or(0) as u64,
            move_to: list.find_str("move").map(str::to_string),
            done_time: list.find_int("done-time").map(|n| n as u64),
            error: list.find_str("error").map(str::to_string),
            error_time: list.find_int("error-time").map(|n| n as u64),
            attempt: list.find_int("attempt").unwrap_or(0) as u32,
            server_pid: list.find_int("server").map(|n| n as u32),
            data_files,
            destinations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> JobTicket {
        let mut job = JobTicket::new(JobTicketConfig {
            identifier: "host1-7".into(),
            number: 7,
            hostname: "host1".into(),
            priority: Priority('A'),
            class: None,
            logname: "alice".into(),
            from_host: "host1".into(),
            auth_user: None,
        });
        job.data_files.push(DataFile::new(
            "/spool/lp/dfA007host1",
            "report.txt",
            'f',
            3,
        ));
        job
    }

    #[test]
    fn serialize_then_parse_round_trips() {
        let job = sample();
        let list = job.to_linelist();
        let parsed = JobTicket::from_linelist(&list).expect("parses");
        assert_eq!(parsed, job);
    }

    #[test]
    fn held_job_is_not_schedulable_but_not_removed() {
        let mut job = sample();
        job.hold_time = 1234;
        assert!(job.is_held());
        assert!(!job.is_removed());
        assert!(!job.schedulable());
    }

    #[test]
    fn removed_job_is_not_schedulable() {
        let mut job = sample();
        job.remove_time = 1234;
        assert!(!job.schedulable());
    }

    #[test]
    fn from_linelist_rejects_missing_identity_field() {
        let mut list = LineList::new();
        list.set_int("number", 1);
        assert!(JobTicket::from_linelist(&list).is_none());
    }

    #[test]
    fn total_size_accounts_for_copies() {
        let mut job = sample();
        job.data_files[0].copies = 2;
        assert_eq!(job.total_size(), 6);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn token() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,7}"
    }

    proptest! {
        /// A job ticket built from arbitrary scalar fields survives a
        /// `to_linelist`/`from_linelist` round trip (spec §8's job-ticket
        /// serialize/parse round-trip law).
        #[test]
        fn scalar_fields_survive_a_linelist_round_trip(
            identifier in token(),
            number in 0u32..100_000,
            hostname in token(),
            priority_index in 0u8..26,
            class in proptest::option::of(token()),
            logname in token(),
            from_host in token(),
            hold_time in 0u64..1_000_000_000,
            remove_time in 0u64..1_000_000_000,
            attempt in 0u32..20,
        ) {
            let priority = (b'A' + priority_index) as char;
            let mut job = JobTicket::new(JobTicketConfig {
                identifier,
                number,
                hostname,
                priority: Priority(priority),
                class,
                logname,
                from_host,
                auth_user: None,
            });
            job.hold_time = hold_time;
            job.remove_time = remove_time;
            job.attempt = attempt;

            let list = job.to_linelist();
            let parsed = JobTicket::from_linelist(&list).expect("parses");
            prop_assert_eq!(parsed, job);
        }
    }
}
