// SPDX-License-Identifier: MIT

//! A parsed (but not yet resolved) printcap record (spec §3 "Printcap
//! entry", §4.2 step 1-2).

use lpd_core::LineList;

/// Whether the local process is acting as a server accepting jobs or a
/// client submitting/querying them — determines which `:server`/`:client`
/// tagged records and `role.key` overrides apply (spec §4.2 step 2, 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

impl Role {
    fn tag(self) -> &'static str {
        match self {
            Role::Server => "server",
            Role::Client => "client",
        }
    }
}

/// A record's declared visibility (spec §3 "Printcap entry": "Entries
/// annotated `:server` or `:client` are visible only in that role").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Any,
    ServerOnly,
    ClientOnly,
}

/// One printcap record: a primary name, its aliases, and its raw option
/// `LineList` (spec §3 "Printcap entry" — "a keyed LineList of option
/// values").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub primary: String,
    pub aliases: Vec<String>,
    pub options: LineList,
}

impl RawRecord {
    /// All names (primary + aliases) this record answers to.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn visibility(&self) -> Visibility {
        let server = self.options.find_flag("server").unwrap_or(false);
        let client = self.options.find_flag("client").unwrap_or(false);
        match (server, client) {
            (true, false) => Visibility::ServerOnly,
            (false, true) => Visibility::ClientOnly,
            _ => Visibility::Any,
        }
    }

    pub fn oh_pattern(&self) -> Option<&str> {
        self.options.find_str("oh")
    }

    /// Whether this record should be visible given the current role and
    /// local host (spec §4.2 step 2).
    pub fn matches_role_and_host(&self, role: Role, local_addresses_match: impl Fn(&str) -> bool) -> bool {
        let visible_for_role = match self.visibility() {
            Visibility::Any => true,
            Visibility::ServerOnly => role == Role::Server,
            Visibility::ClientOnly => role == Role::Client,
        };
        if !visible_for_role {
            return false;
        }
        match self.oh_pattern() {
            Some(pattern) => local_addresses_match(pattern),
            None => true,
        }
    }

    /// `tc=name,name,...` inclusion targets, in order (spec §3, §4.2 step 5).
    pub fn tc_includes(&self) -> Vec<String> {
        self.options
            .find_str("tc")
            .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Role-tag overrides present on this record: `(role.key, value)` pairs
    /// for the given role (spec §4.2 step 7).
    pub fn role_overrides(&self, role: Role) -> Vec<(String, String)> {
        let prefix = format!("{}.", role.tag());
        self.options
            .iter()
            .filter_map(|line| {
                let key_end = line.find(['=', '#', '@']).unwrap_or(line.len());
                let key = &line[..key_end];
                let rest = &line[key_end..];
                key.strip_prefix(&prefix)
                    .map(|overridden_key| (overridden_key.to_string(), rest.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(options_src: &str) -> RawRecord {
        RawRecord {
            primary: "lp".into(),
            aliases: vec![],
            options: LineList::split(options_src, ":", false, "=#@", false, true, false, ":"),
        }
    }

    #[test]
    fn server_only_record_is_hidden_from_client_role() {
        let r = record("server");
        assert_eq!(r.visibility(), Visibility::ServerOnly);
        assert!(!r.matches_role_and_host(Role::Client, |_| true));
        assert!(r.matches_role_and_host(Role::Server, |_| true));
    }

    #[test]
    fn oh_pattern_gates_on_local_address() {
        let r = record("oh=10.0.0.*");
        assert!(r.matches_role_and_host(Role::Server, |pattern| pattern == "10.0.0.*"));
        assert!(!r.matches_role_and_host(Role::Server, |_| false));
    }

    #[test]
    fn tc_includes_splits_on_comma() {
        let r = record("tc=base,common");
        assert_eq!(r.tc_includes(), vec!["base".to_string(), "common".to_string()]);
    }

    #[test]
    fn role_overrides_extracts_matching_role_keys_only() {
        let r = record("server.lp=/dev/lp1:client.lp=/dev/lp0");
        let overrides = r.role_overrides(Role::Server);
        assert_eq!(overrides, vec![("lp".to_string(), "=/dev/lp1".to_string())]);
    }
}
