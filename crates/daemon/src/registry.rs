// SPDX-License-Identifier: MIT

//! Resolves a queue name into everything the scheduler and the request
//! handlers need: its spool layout, its device or forwarding target, and
//! its filter commands (spec §4.2, glossary "Printcap").

use crate::config::Config;
use crate::error::DaemonError;
use lpd_core::HostInfo;
use lpd_printcap::{parse_rules, ExpansionContext, PrintcapResolver, Role, Rule};
use lpd_storage::SpoolLayout;
use std::path::PathBuf;

/// Where a print pipeline's finished bytes go.
#[derive(Debug, Clone)]
pub enum Destination {
    Local { device_path: PathBuf },
    Remote { host: String, port: u16, queue: String },
}

/// Everything resolved from one printcap entry that the scheduler and
/// pipeline need to run a queue.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub name: String,
    pub layout: SpoolLayout,
    pub destination: Option<Destination>,
    pub of_filter: Option<String>,
    pub if_filter: Option<String>,
    pub suppress_header: bool,
    pub banner_last: bool,
    pub ff_separator: bool,
    /// Whether a forward to [`Destination::Remote`] must go out wrapped in
    /// the secure-transfer envelope (spec §4.10: "when forwarding a job to
    /// another host or when a server is configured to require
    /// authentication"), and which auth provider name to tag it with.
    pub requires_auth: bool,
    pub auth_type: String,
}

/// Loads printcap + permissions once at startup (and again on `SIGHUP`)
/// and resolves individual queues against them.
pub struct Registry {
    resolver: PrintcapResolver,
    rules: Vec<Rule>,
    local_host: HostInfo,
    spool_root: PathBuf,
    outbound_port: u16,
}

impl Registry {
    pub fn load(config: &Config, local_host: HostInfo) -> Result<Self, DaemonError> {
        let printcap_text = config
            .printcap_paths
            .iter()
            .filter_map(|path| std::fs::read_to_string(path).ok())
            .collect::<Vec<_>>()
            .join("\n");
        let records = lpd_printcap::parse_source(&printcap_text);
        let resolver = PrintcapResolver::build(records, Role::Server, &local_host, config.tc_depth);

        let rules_text = std::fs::read_to_string(&config.permissions_path).unwrap_or_default();
        let rules = parse_rules(&rules_text);

        Ok(Self { resolver, rules, local_host, spool_root: config.spool_root.clone(), outbound_port: config.outbound_port })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Every queue name the dispatcher should be running a scheduler for
    /// (spec §4.7 step 6).
    pub fn queue_names(&self) -> Vec<String> {
        self.resolver.primaries().map(str::to_string).collect()
    }

    pub fn resolve(&self, name: &str) -> Result<QueueSettings, DaemonError> {
        let ctx = ExpansionContext {
            printer: name.to_string(),
            short_host: self.local_host.short_name.clone(),
            fqdn: self.local_host.fqdn.clone(),
            remote_printer: None,
            remote_host: None,
            date: String::new(),
        };
        let resolved = self.resolver.resolve(name, &self.local_host, &ctx)?;
        let options = &resolved.options;
        let layout = SpoolLayout::new(&self.spool_root, &resolved.primary);

        let destination = if let Some(device) = options.find_str("lp").filter(|s| !s.is_empty()) {
            Some(Destination::Local { device_path: PathBuf::from(device) })
        } else if let Some(remote_host) = options.find_str("rm") {
            let remote_queue = options.find_str("rp").unwrap_or(&resolved.primary).to_string();
            let port = options.find_int("rp-port").map(|p| p as u16).unwrap_or(self.outbound_port);
            Some(Destination::Remote { host: remote_host.to_string(), port, queue: remote_queue })
        } else {
            None
        };

        Ok(QueueSettings {
            name: resolved.primary,
            layout,
            destination,
            of_filter: options.find_str("of").map(str::to_string),
            if_filter: options.find_str("if").map(str::to_string),
            suppress_header: options.find_flag("sh").unwrap_or(false),
            banner_last: options.find_flag("hl").unwrap_or(false),
            ff_separator: !options.find_flag("sf").unwrap_or(false),
            requires_auth: options.find_flag("auth").unwrap_or(false),
            auth_type: options.find_str("authtype").unwrap_or("default").to_string(),
        })
    }
}
