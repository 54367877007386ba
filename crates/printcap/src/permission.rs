// SPDX-License-Identifier: MIT

//! Permission rule engine: evaluates an ordered rule list against a
//! (service, user, host, job) check context (spec §4.3).

use crate::glob;
use std::fs;
use std::net::IpAddr;

/// The closed set of service letters a rule or context may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Print,
    Query,
    Remove,
    Control,
    Connect,
    Receive,
}

impl Service {
    fn letter(self) -> char {
        match self {
            Service::Print => 'P',
            Service::Query => 'Q',
            Service::Remove => 'M',
            Service::Control => 'C',
            Service::Connect => 'X',
            Service::Receive => 'R',
        }
    }
}

/// ACCEPT or REJECT — the only two outcomes callers see. A rule that
/// matches no clause is simply not a match (NOT-MATCH); the engine keeps
/// looking and falls back to ACCEPT if nothing ever matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

/// The tuple a permission check is evaluated against.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub service: Option<Service>,
    pub user: String,
    pub host: String,
    pub remote_user: String,
    pub remote_host: String,
    pub ip: Option<IpAddr>,
    pub remote_ip: Option<IpAddr>,
    pub port: Option<u16>,
    pub printer: String,
    pub forwarded: bool,
    pub auth: bool,
    pub auth_type: Option<String>,
    pub auth_user: Option<String>,
    pub auth_from: Option<String>,
    pub groups: Vec<String>,
    pub server: bool,
    pub lpc: bool,
}

/// One `key=value[,value...]` clause, or a bare keyword asserting a
/// boolean clause true (e.g. `samehost`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub key: String,
    pub values: Vec<String>,
}

impl Clause {
    fn matches(&self, ctx: &Context, netgroup_member: &dyn Fn(&str, &str) -> bool) -> bool {
        match self.key.as_str() {
            "service" => ctx
                .service
                .is_some_and(|s| self.values.iter().any(|v| v.eq_ignore_ascii_case(&s.letter().to_string()))),
            "user" => self.any_value_matches(&ctx.user, netgroup_member),
            "host" => self.any_value_matches(&ctx.host, netgroup_member),
            "remotehost" => self.any_value_matches(&ctx.remote_host, netgroup_member),
            "remoteuser" => self.any_value_matches(&ctx.remote_user, netgroup_member),
            "controluser" => self.any_value_matches(&ctx.remote_user, netgroup_member),
            "printer" => self.any_value_matches(&ctx.printer, netgroup_member),
            "authtype" => ctx.auth_type.as_deref().is_some_and(|v| self.any_value_matches(v, netgroup_member)),
            "authuser" => ctx.auth_user.as_deref().is_some_and(|v| self.any_value_matches(v, netgroup_member)),
            "authfrom" => ctx.auth_from.as_deref().is_some_and(|v| self.any_value_matches(v, netgroup_member)),
            "group" => ctx.groups.iter().any(|g| self.any_value_matches(g, netgroup_member)),
            "ip" => ctx.ip.is_some_and(|addr| self.any_ip_matches(addr)),
            "remoteip" => ctx.remote_ip.is_some_and(|addr| self.any_ip_matches(addr)),
            "port" => ctx.port.is_some_and(|p| self.values.iter().any(|v| v.parse::<u16>().ok() == Some(p))),
            "forwarded" => self.bool_matches(ctx.forwarded),
            "samehost" => self.bool_matches(!ctx.host.is_empty() && ctx.host.eq_ignore_ascii_case(&ctx.remote_host)),
            "sameuser" => self.bool_matches(!ctx.user.is_empty() && ctx.user == ctx.remote_user),
            "authsameuser" => self.bool_matches(ctx.auth_user.as_deref() == Some(ctx.remote_user.as_str())),
            "auth" => self.bool_matches(ctx.auth),
            "server" => self.bool_matches(ctx.server),
            "lpc" => self.bool_matches(ctx.lpc),
            _ => false,
        }
    }

    fn any_value_matches(&self, candidate: &str, netgroup_member: &dyn Fn(&str, &str) -> bool) -> bool {
        self.values.iter().any(|v| value_matches(v, candidate, netgroup_member))
    }

    fn any_ip_matches(&self, addr: IpAddr) -> bool {
        self.values.iter().any(|v| cidr_matches(v, addr))
    }

    fn bool_matches(&self, actual: bool) -> bool {
        self.values.iter().any(|v| parse_bool(v) == Some(actual))
    }
}

/// One permissions-file line: an unordered set of clauses that must all
/// match, plus the verdict it carries (spec §4.3: "a rule matches iff
/// every clause matches").
#[derive(Debug, Clone)]
pub struct Rule {
    pub clauses: Vec<Clause>,
    pub verdict: Verdict,
}

impl Rule {
    /// Parse one whitespace-separated permissions-file line. Returns
    /// `None` if the line carries no `accept`/`reject` keyword.
    pub fn parse(line: &str) -> Option<Self> {
        let mut clauses = Vec::new();
        let mut verdict = None;
        for token in line.split_whitespace() {
            match token.to_ascii_lowercase().as_str() {
                "accept" => verdict = Some(Verdict::Accept),
                "reject" => verdict = Some(Verdict::Reject),
                _ => match token.split_once('=') {
                    Some((key, values)) => clauses.push(Clause {
                        key: key.to_string(),
                        values: values.split(',').map(str::to_string).collect(),
                    }),
                    None => clauses.push(Clause {
                        key: token.to_string(),
                        values: vec!["yes".to_string()],
                    }),
                },
            }
        }
        verdict.map(|verdict| Rule { clauses, verdict })
    }

    fn matches(&self, ctx: &Context, netgroup_member: &dyn Fn(&str, &str) -> bool) -> bool {
        self.clauses.iter().all(|c| c.matches(ctx, netgroup_member))
    }
}

/// Parse a permissions file, skipping blank and `#`-comment lines.
pub fn parse_rules(src: &str) -> Vec<Rule> {
    src.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(Rule::parse)
        .collect()
}

/// First matching rule wins; no match → default ACCEPT (spec §4.3).
pub fn evaluate(rules: &[Rule], ctx: &Context) -> Verdict {
    evaluate_with_netgroups(rules, ctx, &|_, _| false)
}

/// As [`evaluate`], but resolves `@name` clauses through a caller-supplied
/// netgroup membership test instead of always failing them.
pub fn evaluate_with_netgroups(rules: &[Rule], ctx: &Context, netgroup_member: &dyn Fn(&str, &str) -> bool) -> Verdict {
    for rule in rules {
        if rule.matches(ctx, netgroup_member) {
            return rule.verdict;
        }
    }
    Verdict::Accept
}

fn value_matches(value: &str, candidate: &str, netgroup_member: &dyn Fn(&str, &str) -> bool) -> bool {
    if let Some(name) = value.strip_prefix('@') {
        netgroup_member(name, candidate)
    } else if value.starts_with('/') {
        file_contains_match(value, candidate)
    } else {
        glob::matches(value, candidate)
    }
}

fn file_contains_match(path: &str, candidate: &str) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .any(|pattern| glob::matches(pattern, candidate))
}

fn cidr_matches(value: &str, addr: IpAddr) -> bool {
    let Some((net_str, prefix_str)) = value.split_once('/') else {
        return value.parse::<IpAddr>().map(|v| v == addr).unwrap_or(false);
    };
    let (Ok(net), Ok(prefix)) = (net_str.parse::<IpAddr>(), prefix_str.parse::<u32>()) else {
        return false;
    };
    match (net, addr) {
        (IpAddr::V4(n), IpAddr::V4(a)) => {
            let mask = ipv4_mask(prefix);
            (u32::from(n) & mask) == (u32::from(a) & mask)
        }
        (IpAddr::V6(n), IpAddr::V6(a)) => {
            let mask = ipv6_mask(prefix);
            (u128::from(n) & mask) == (u128::from(a) & mask)
        }
        _ => false,
    }
}

fn ipv4_mask(prefix: u32) -> u32 {
    if prefix == 0 {
        0
    } else if prefix >= 32 {
        u32::MAX
    } else {
        !0u32 << (32 - prefix)
    }
}

fn ipv6_mask(prefix: u32) -> u128 {
    if prefix == 0 {
        0
    } else if prefix >= 128 {
        u128::MAX
    } else {
        !0u128 << (128 - prefix)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Some(true),
        "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn ctx() -> Context {
        Context {
            service: Some(Service::Print),
            user: "alice".into(),
            host: "printhost".into(),
            remote_user: "alice".into(),
            remote_host: "client1".into(),
            ip: Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))),
            remote_ip: Some(IpAddr::V4(Ipv4Addr::new(10, 0, 5, 9))),
            port: Some(515),
            printer: "lp".into(),
            ..Default::default()
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = parse_rules("service=Q reject\nservice=P user=alice accept");
        assert_eq!(evaluate(&rules, &ctx()), Verdict::Accept);
    }

    #[test]
    fn no_matching_rule_defaults_to_accept() {
        let rules = parse_rules("service=Q reject");
        assert_eq!(evaluate(&rules, &ctx()), Verdict::Accept);
    }

    #[test]
    fn rule_requires_every_clause_to_match() {
        let rules = parse_rules("service=P user=bob reject");
        assert_eq!(evaluate(&rules, &ctx()), Verdict::Accept);
    }

    #[test]
    fn glob_user_clause_matches() {
        let rules = parse_rules("user=al* reject");
        assert_eq!(evaluate(&rules, &ctx()), Verdict::Reject);
    }

    #[test]
    fn cidr_ip_clause_matches_subnet() {
        let rules = parse_rules("remoteip=10.0.0.0/16 reject");
        assert_eq!(evaluate(&rules, &ctx()), Verdict::Reject);
    }

    #[test]
    fn cidr_ip_clause_rejects_outside_subnet() {
        let rules = parse_rules("remoteip=10.1.0.0/16 reject");
        assert_eq!(evaluate(&rules, &ctx()), Verdict::Accept);
    }

    #[test]
    fn bare_boolean_clause_asserts_true() {
        let mut c = ctx();
        c.host = "printhost".into();
        c.remote_host = "printhost".into();
        let rules = parse_rules("samehost reject");
        assert_eq!(evaluate(&rules, &c), Verdict::Reject);
    }

    #[test]
    fn netgroup_clause_delegates_to_resolver() {
        let rules = parse_rules("user=@operators reject");
        let verdict = evaluate_with_netgroups(&rules, &ctx(), &|name, user| name == "operators" && user == "alice");
        assert_eq!(verdict, Verdict::Reject);
    }
}
