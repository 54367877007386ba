// SPDX-License-Identifier: MIT

//! Job ticket storage: atomic read/write of `hf*` files and enumeration of
//! a queue's spool directory (spec §3 "Job ticket", invariant 3).

use crate::atomic::write_atomic;
use crate::error::StorageError;
use lpd_core::{JobTicket, LineList, QueueFile, QueueFileKind};
use std::path::{Path, PathBuf};

/// Filesystem layout of one queue's spool directory (spec §3 "Spool
/// directory").
#[derive(Debug, Clone)]
pub struct SpoolLayout {
    queue_dir: PathBuf,
}

impl SpoolLayout {
    pub fn new(spool_root: impl AsRef<Path>, queue: &str) -> Self {
        Self {
            queue_dir: spool_root.as_ref().join(queue),
        }
    }

    pub fn queue_dir(&self) -> &Path {
        &self.queue_dir
    }

    pub fn control_path(&self) -> PathBuf {
        self.queue_dir.join("control")
    }

    pub fn status_path(&self) -> PathBuf {
        self.queue_dir.join("status")
    }

    pub fn log_path(&self) -> PathBuf {
        self.queue_dir.join("log")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.queue_dir.join("lock")
    }

    pub fn unspooler_path(&self) -> PathBuf {
        self.queue_dir.join("unspooler")
    }

    pub fn status_cache_dir(&self) -> PathBuf {
        self.queue_dir.join("lpq-cache")
    }

    pub fn job_ticket_path(&self, priority: char, number: u32, host: &str) -> PathBuf {
        self.queue_dir
            .join(QueueFile::job_ticket(priority, number, host).filename())
    }

    pub fn control_file_path(&self, priority: char, number: u32, host: &str) -> PathBuf {
        self.queue_dir
            .join(QueueFile::control_file(priority, number, host).filename())
    }

    pub fn data_file_path(&self, letter: char, priority: char, number: u32, host: &str) -> PathBuf {
        self.queue_dir
            .join(QueueFile::data_file(letter, priority, number, host).filename())
    }

    pub fn ensure_exists(&self, dir_perms: u32) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.queue_dir)
            .map_err(|e| StorageError::io(&self.queue_dir, e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(dir_perms);
            std::fs::set_permissions(&self.queue_dir, perms)
                .map_err(|e| StorageError::io(&self.queue_dir, e))?;
        }
        Ok(())
    }
}

fn ticket_to_text(ticket: &JobTicket) -> String {
    ticket.to_linelist().join("\n")
}

fn ticket_from_text(text: &str) -> Option<JobTicket> {
    let list = LineList::split(text, "\n", false, "=#@", false, true, false, "");
    JobTicket::from_linelist(&list)
}

/// Reads and writes job tickets for one queue, honoring atomic
/// write-then-rename (spec invariant 3).
pub struct TicketStore {
    layout: SpoolLayout,
}

impl TicketStore {
    pub fn new(layout: SpoolLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SpoolLayout {
        &self.layout
    }

    /// Write a job ticket atomically. `priority`/`number`/`host` must match
    /// the ticket's own fields; the filename is derived separately so
    /// callers can rename a ticket (priority change) by writing to the new
    /// path and removing the old one.
    pub fn write(&self, ticket: &JobTicket) -> Result<PathBuf, StorageError> {
        let path = self.layout.job_ticket_path(
            ticket.priority.0,
            ticket.number,
            &ticket.hostname,
        );
        write_atomic(&path, ticket_to_text(ticket).as_bytes())?;
        Ok(path)
    }

    /// Read a single job ticket by its identity. Returns `Ok(None)` for a
    /// missing or malformed file — invariant 3 requires readers to treat a
    /// partially-written or already-removed ticket as "job gone", not as
    /// an error.
    pub fn read(&self, priority: char, number: u32, host: &str) -> Result<Option<JobTicket>, StorageError> {
        let path = self.layout.job_ticket_path(priority, number, host);
        self.read_path(&path)
    }

    fn read_path(&self, path: &Path) -> Result<Option<JobTicket>, StorageError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(ticket_from_text(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    /// Enumerate every job ticket currently in the queue directory,
    /// skipping entries that fail to parse as a filename or as a ticket
    /// (treated as "job gone" per invariant 3) rather than failing the scan.
    pub fn scan(&self) -> Result<Vec<JobTicket>, StorageError> {
        let dir = self.layout.queue_dir();
        let read_dir = match std::fs::read_dir(dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(dir, e)),
        };

        let mut tickets = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| StorageError::io(dir, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(parsed) = QueueFile::parse(&name) else {
                continue;
            };
            if parsed.kind != QueueFileKind::JobTicket {
                continue;
            }
            if let Some(ticket) = self.read_path(&entry.path())? {
                tickets.push(ticket);
            }
        }
        Ok(tickets)
    }

    /// Physically remove a job's ticket and all its data files (spec §3
    /// Lifecycles: "destroyed when all data files have been physically
    /// unlinked after successful print").
    pub fn remove(&self, ticket: &JobTicket) -> Result<(), StorageError> {
        let ticket_path = self.layout.job_ticket_path(
            ticket.priority.0,
            ticket.number,
            &ticket.hostname,
        );
        remove_if_exists(&ticket_path)?;

        let control_path = self.layout.control_file_path(
            ticket.priority.0,
            ticket.number,
            &ticket.hostname,
        );
        remove_if_exists(&control_path)?;

        for (i, _) in ticket.data_files.iter().enumerate() {
            let letter = (b'a' + (i as u8 % 26)) as char;
            let data_path = self.layout.data_file_path(
                letter,
                ticket.priority.0,
                ticket.number,
                &ticket.hostname,
            );
            remove_if_exists(&data_path)?;
        }
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io(path, e)),
    }
}
