// SPDX-License-Identifier: MIT

//! Identifiers: printer/queue names and spool filename conventions.

crate::define_id! {
    /// Name of a printer queue, as resolved through the printcap (spec §3, §4.2).
    pub struct PrinterName;
}

/// Truncate a string to a short prefix for log lines and status display.
pub trait ShortId {
    fn short(&self, n: usize) -> &str;
}

impl ShortId for str {
    fn short(&self, n: usize) -> &str {
        if self.len() <= n {
            self
        } else {
            &self[..n]
        }
    }
}

/// The three spool filename kinds from spec §3 ("Spool directory"):
/// `hfAnnn<host>` (job ticket), `cfAnnn<host>` (control file image),
/// `dfXnnn<host>` (data file, one per `X` letter `A`..`Z`/`a`..`z`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueFileKind {
    JobTicket,
    ControlFile,
    DataFile(char),
}

/// A parsed or constructed spool filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueFile {
    pub kind: QueueFileKind,
    pub priority: char,
    pub number: u32,
    pub host: String,
}

impl QueueFile {
    pub fn job_ticket(priority: char, number: u32, host: impl Into<String>) -> Self {
        Self {
            kind: QueueFileKind::JobTicket,
            priority,
            number,
            host: host.into(),
        }
    }

    pub fn control_file(priority: char, number: u32, host: impl Into<String>) -> Self {
        Self {
            kind: QueueFileKind::ControlFile,
            priority,
            number,
            host: host.into(),
        }
    }

    pub fn data_file(letter: char, priority: char, number: u32, host: impl Into<String>) -> Self {
        Self {
            kind: QueueFileKind::DataFile(letter),
            priority,
            number,
            host: host.into(),
        }
    }

    /// Render the on-disk filename, e.g. `hfA007host1`, `dfA007host1`.
    pub fn filename(&self) -> String {
        let prefix = match self.kind {
            QueueFileKind::JobTicket => "hf".to_string(),
            QueueFileKind::ControlFile => "cf".to_string(),
            QueueFileKind::DataFile(letter) => format!("d{letter}"),
        };
        format!("{prefix}{}{:03}{}", self.priority, self.number, self.host)
    }

    /// Parse a spool filename back into its parts. Returns `None` if the
    /// name does not match the `{hf,cf,dX}{A-Za-z}{3 digits}{host}` shape.
    pub fn parse(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() < 6 {
            return None;
        }
        let (kind, rest) = if let Some(rest) = name.strip_prefix("hf") {
            (QueueFileKind::JobTicket, rest)
        } else if let Some(rest) = name.strip_prefix("cf") {
            (QueueFileKind::ControlFile, rest)
        } else if name.starts_with('d') && bytes.len() > 1 {
            (QueueFileKind::DataFile(bytes[1] as char), &name[2..])
        } else {
            return None;
        };
        let mut chars = rest.chars();
        let priority = chars.next()?;
        let digits: String = chars.by_ref().take(3).collect();
        if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number: u32 = digits.parse().ok()?;
        let host: String = chars.collect();
        if host.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            priority,
            number,
            host,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ticket_filename_round_trips() {
        let f = QueueFile::job_ticket('A', 7, "workstation1");
        assert_eq!(f.filename(), "hfA007workstation1");
        assert_eq!(QueueFile::parse(&f.filename()), Some(f));
    }

    #[test]
    fn data_file_filename_round_trips() {
        let f = QueueFile::data_file('A', 'C', 42, "h2");
        assert_eq!(f.filename(), "dAC042h2");
        assert_eq!(QueueFile::parse(&f.filename()), Some(f));
    }

    #[test]
    fn parse_rejects_short_or_malformed_names() {
        assert_eq!(QueueFile::parse("hf"), None);
        assert_eq!(QueueFile::parse("xxA007host"), None);
        assert_eq!(QueueFile::parse("hfA07host"), None);
    }

    #[test]
    fn printer_name_short_truncates() {
        let p = PrinterName::new("laser-printer-room-2");
        assert_eq!(p.short(5), "laser");
    }
}
