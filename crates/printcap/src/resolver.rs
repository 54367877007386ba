// SPDX-License-Identifier: MIT

//! Printer name resolution: indexing, `tc=` expansion, role overrides and
//! `%`-expansion (spec §4.2).

use crate::entry::{RawRecord, Role};
use crate::error::PrintcapError;
use crate::expand::{self, ExpansionContext};
use crate::glob;
use lpd_core::{HostInfo, LineList, PrintcapValue};
use std::collections::HashMap;

/// A key's implied default when a record leaves it unset (spec §4.2 step
/// 6). Not exhaustive — the subset of classic `printcap` keys this
/// implementation gives a documented default for; anything else is simply
/// absent from the resolved entry.
const DEFAULTS: &[(&str, PrintcapValue)] = &[
    ("mx", PrintcapValue::Int(0)),
    ("sh", PrintcapValue::Flag(false)),
    ("sf", PrintcapValue::Flag(false)),
    ("rw", PrintcapValue::Flag(false)),
];

fn render_default(key: &str, value: &PrintcapValue) -> String {
    match value {
        PrintcapValue::Flag(true) => key.to_string(),
        PrintcapValue::Flag(false) => format!("{key}@"),
        PrintcapValue::Int(n) => format!("{key}#{n}"),
        PrintcapValue::Str(s) => format!("{key}={s}"),
    }
}

/// The result of resolving a printer name: its aliases and a fully merged,
/// defaulted, overridden, and `%`-expanded option list.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub primary: String,
    pub aliases: Vec<String>,
    pub options: LineList,
}

/// Indexes a set of already role/host-filtered records and resolves
/// printer names against them (spec §4.2 steps 3-8).
pub struct PrintcapResolver {
    name_to_primary: HashMap<String, String>,
    primary_to_record: HashMap<String, RawRecord>,
    insertion_order: Vec<String>,
    role: Role,
    max_tc_depth: u32,
}

impl PrintcapResolver {
    /// Build a resolver from raw records, keeping only those visible under
    /// `role`/`local_host` (spec §4.2 step 2).
    pub fn build(records: Vec<RawRecord>, role: Role, local_host: &HostInfo, max_tc_depth: u32) -> Self {
        let mut name_to_primary = HashMap::new();
        let mut primary_to_record = HashMap::new();
        let mut insertion_order = Vec::new();

        for record in records {
            let visible = record.matches_role_and_host(role, |pattern| {
                local_host
                    .addresses
                    .iter()
                    .any(|addr| glob::matches(pattern, &addr.to_string()))
            });
            if !visible {
                continue;
            }
            for name in record.names() {
                name_to_primary.insert(name.to_string(), record.primary.clone());
            }
            insertion_order.push(record.primary.clone());
            primary_to_record.insert(record.primary.clone(), record);
        }

        Self {
            name_to_primary,
            primary_to_record,
            insertion_order,
            role,
            max_tc_depth,
        }
    }

    /// Every visible record's primary name, in printcap source order (spec
    /// §4.7 step 6: "enumerates printcap entries" to find queues needing a
    /// scheduler).
    pub fn primaries(&self) -> impl Iterator<Item = &str> {
        self.insertion_order.iter().map(String::as_str)
    }

    /// Resolve `name` to its primary record, merging `tc=` chains, applying
    /// defaults and role overrides, then `%`-expanding string values (spec
    /// §4.2 steps 4-8).
    pub fn resolve(
        &self,
        name: &str,
        local_host: &HostInfo,
        expand_ctx: &ExpansionContext,
    ) -> Result<ResolvedEntry, PrintcapError> {
        let primary = self.find_primary(name).ok_or_else(|| {
            tracing::warn!(printer = name, "no printcap entry matched");
            PrintcapError::NotFound(name.to_string())
        })?;
        let record = self
            .primary_to_record
            .get(&primary)
            .ok_or_else(|| PrintcapError::NotFound(name.to_string()))?;

        let mut merged = LineList::new();
        self.merge_tc_chain(&primary, self.max_tc_depth, &mut merged)?;

        for (key, raw) in record.role_overrides(self.role) {
            merged.add(format!("{key}{raw}"), "=#@", true, true);
        }

        for entry in DEFAULTS.iter() {
            let key = entry.0;
            let default = &entry.1;
            if merged.find_str(key).is_none()
                && merged.find_int(key).is_none()
                && merged.find_flag(key).is_none()
            {
                merged.append(render_default(key, default));
            }
        }

        let ctx = ExpansionContext {
            printer: primary.clone(),
            short_host: local_host.short_name.clone(),
            fqdn: local_host.fqdn.clone(),
            ..expand_ctx.clone()
        };
        let expanded = expand_values(&merged, &ctx);

        Ok(ResolvedEntry {
            primary: record.primary.clone(),
            aliases: record.aliases.clone(),
            options: expanded,
        })
    }

    /// Exact match, then partial-glob match over every known name, then
    /// the `*` fallback record (spec §4.2 step 4).
    fn find_primary(&self, name: &str) -> Option<String> {
        if let Some(primary) = self.name_to_primary.get(name) {
            return Some(primary.clone());
        }
        for candidate in &self.insertion_order {
            if let Some(record) = self.primary_to_record.get(candidate) {
                for n in record.names() {
                    if glob::has_wildcard(n) && glob::matches(n, name) {
                        return Some(record.primary.clone());
                    }
                }
            }
        }
        self.name_to_primary.get("*").cloned()
    }

    fn merge_tc_chain(&self, primary: &str, depth_budget: u32, into: &mut LineList) -> Result<(), PrintcapError> {
        let Some(record) = self.primary_to_record.get(primary) else {
            return Ok(());
        };
        for included in record.tc_includes() {
            if depth_budget == 0 {
                tracing::error!(printer = primary, "tc= inclusion depth exceeded");
                return Err(PrintcapError::TcDepthExceeded(primary.to_string()));
            }
            self.merge_tc_chain(&included, depth_budget - 1, into)?;
        }
        for line in record.options.iter() {
            into.add(line.to_string(), "=#@", true, true);
        }
        Ok(())
    }
}

fn expand_values(list: &LineList, ctx: &ExpansionContext) -> LineList {
    let mut out = LineList::new();
    for line in list.iter() {
        let sep_pos = line.find(['=', '#', '@']);
        let expanded = match sep_pos {
            Some(pos) if line.as_bytes()[pos] == b'=' => {
                format!("{}={}", &line[..pos], expand::expand(&line[pos + 1..], ctx))
            }
            _ => line.to_string(),
        };
        out.append(expanded);
    }
    out
}
