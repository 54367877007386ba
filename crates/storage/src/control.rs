// SPDX-License-Identifier: MIT

//! The `control` file: per-queue administrative flags (spec §3 "Spool
//! directory").

use crate::atomic::write_atomic;
use crate::error::StorageError;
use lpd_core::LineList;
use std::path::Path;

/// Spool-control state for one queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpoolControl {
    pub printing_disabled: bool,
    pub spooling_disabled: bool,
    pub aborted: bool,
    pub classes: Vec<String>,
    pub debug_overrides: Option<String>,
    pub forward_target: Option<String>,
    pub operator_message: Option<String>,
}

impl SpoolControl {
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::from_linelist(&LineList::split(
                &text, "\n", false, "=#@", false, true, true, "",
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        write_atomic(path, self.to_linelist().join("\n").as_bytes())
    }

    fn to_linelist(&self) -> LineList {
        let mut list = LineList::new();
        if self.printing_disabled {
            list.append("printing-disabled");
        }
        if self.spooling_disabled {
            list.append("spooling-disabled");
        }
        if self.aborted {
            list.append("aborted");
        }
        if !self.classes.is_empty() {
            list.set_str("classes", &self.classes.join(","));
        }
        if let Some(d) = &self.debug_overrides {
            list.set_str("debug", d);
        }
        if let Some(f) = &self.forward_target {
            list.set_str("forward", f);
        }
        if let Some(m) = &self.operator_message {
            list.set_str("message", m);
        }
        list
    }

    fn from_linelist(list: &LineList) -> Self {
        Self {
            printing_disabled: list.find_flag("printing-disabled").unwrap_or(false),
            spooling_disabled: list.find_flag("spooling-disabled").unwrap_or(false),
            aborted: list.find_flag("aborted").unwrap_or(false),
            classes: list
                .find_str("classes")
                .map(|s| s.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            debug_overrides: list.find_str("debug").map(str::to_string),
            forward_target: list.find_str("forward").map(str::to_string),
            operator_message: list.find_str("message").map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_file_returns_default_control() {
        let dir = tempdir().unwrap();
        let control = SpoolControl::load(&dir.path().join("control")).unwrap();
        assert_eq!(control, SpoolControl::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("control");
        let control = SpoolControl {
            printing_disabled: true,
            spooling_disabled: false,
            aborted: false,
            classes: vec!["A".into(), "B".into()],
            debug_overrides: Some("5".into()),
            forward_target: Some("otherhost".into()),
            operator_message: Some("printer jammed".into()),
        };
        control.save(&path).unwrap();
        let loaded = SpoolControl::load(&path).unwrap();
        assert_eq!(loaded, control);
    }
}
