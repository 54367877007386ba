// SPDX-License-Identifier: MIT

//! Host info record (spec §3 "Host info").
//!
//! Resolving DNS/host information is an external collaborator (spec §1);
//! this module only defines the record shape and the address-set
//! intersection comparison the rest of the daemon relies on.

use std::net::IpAddr;

/// A resolved host record: canonical FQDN, short hostname, and the set of
/// addresses it answers to. Built once per lookup target and compared by
/// address-set intersection, never by name (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub fqdn: String,
    pub short_name: String,
    pub addresses: Vec<IpAddr>,
    pub aliases: Vec<String>,
}

impl HostInfo {
    pub fn new(fqdn: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        let fqdn = fqdn.into();
        let short_name = fqdn.split('.').next().unwrap_or(&fqdn).to_string();
        Self {
            fqdn,
            short_name,
            addresses,
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Two hosts are "the same host" iff their address sets intersect.
    pub fn same_host(&self, other: &HostInfo) -> bool {
        self.addresses.iter().any(|a| other.addresses.contains(a))
    }

    /// True if any address of this host matches `addr`.
    pub fn has_address(&self, addr: &IpAddr) -> bool {
        self.addresses.contains(addr)
    }

    /// All names this host can be referred to by (fqdn, short name, aliases).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.fqdn.as_str())
            .chain(std::iter::once(self.short_name.as_str()))
            .chain(self.aliases.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn same_host_compares_by_address_intersection_not_name() {
        let a = HostInfo::new("printserver.example.com", vec![addr("10.0.0.1")]);
        let b = HostInfo::new("totally-different-name", vec![addr("10.0.0.1")]);
        assert!(a.same_host(&b));
    }

    #[test]
    fn different_addresses_are_not_same_host() {
        let a = HostInfo::new("a.example.com", vec![addr("10.0.0.1")]);
        let b = HostInfo::new("a.example.com", vec![addr("10.0.0.2")]);
        assert!(!a.same_host(&b));
    }

    #[test]
    fn short_name_is_derived_from_fqdn() {
        let h = HostInfo::new("host1.corp.example.com", vec![]);
        assert_eq!(h.short_name, "host1");
    }
}
