// SPDX-License-Identifier: MIT

//! Builds the fixed filter invocation environment (spec §4.4 "an
//! environment including `PRINTER`, `USER`, `LOGNAME`, ...").

use std::collections::HashMap;

/// The environment every filter process is started with, plus a
/// caller-configured pass-through list.
#[derive(Debug, Clone, Default)]
pub struct FilterEnvironment {
    pub printer: String,
    pub user: String,
    pub logname: String,
    pub home: String,
    pub logdir: String,
    pub path: String,
    pub ld_library_path: String,
    pub shell: String,
    pub tz: String,
    pub spool_dir: String,
    pub printcap_entry: String,
    pub ppd: String,
    pub hf: String,
    pub control: String,
    pub data_files: String,
    pub pass_through: HashMap<String, String>,
}

impl FilterEnvironment {
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("PRINTER".to_string(), self.printer.clone());
        env.insert("USER".to_string(), self.user.clone());
        env.insert("LOGNAME".to_string(), self.logname.clone());
        env.insert("HOME".to_string(), self.home.clone());
        env.insert("LOGDIR".to_string(), self.logdir.clone());
        env.insert("PATH".to_string(), self.path.clone());
        env.insert("LD_LIBRARY_PATH".to_string(), self.ld_library_path.clone());
        env.insert("SHELL".to_string(), self.shell.clone());
        env.insert("IFS".to_string(), " \t".to_string());
        env.insert("TZ".to_string(), self.tz.clone());
        env.insert("SPOOL_DIR".to_string(), self.spool_dir.clone());
        env.insert("PRINTCAP_ENTRY".to_string(), self.printcap_entry.clone());
        env.insert("PPD".to_string(), self.ppd.clone());
        env.insert("HF".to_string(), self.hf.clone());
        env.insert("CONTROL".to_string(), self.control.clone());
        env.insert("DATAFILES".to_string(), self.data_files.clone());
        for (key, value) in &self.pass_through {
            env.insert(key.clone(), value.clone());
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_fields_are_all_present() {
        let env = FilterEnvironment {
            printer: "lp".into(),
            ..Default::default()
        }
        .to_map();
        assert_eq!(env.get("PRINTER"), Some(&"lp".to_string()));
        assert_eq!(env.get("IFS"), Some(&" \t".to_string()));
    }

    #[test]
    fn pass_through_entries_are_merged_in() {
        let mut env = FilterEnvironment::default();
        env.pass_through.insert("LANG".into(), "en_US.UTF-8".into());
        let map = env.to_map();
        assert_eq!(map.get("LANG"), Some(&"en_US.UTF-8".to_string()));
    }
}
