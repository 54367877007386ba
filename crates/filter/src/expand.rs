// SPDX-License-Identifier: MIT

//! `$`-expansion of filter argv tokens (spec §4.4 "Token `$`-expansion
//! rules (precise)").

use crate::tokenize::tokenize;
use std::collections::HashMap;

/// Per-job fields available for `$`-expansion: the fixed key-letter map
/// (`P`=printer, `h`=host, `j`=job number, `n`=logname, `f`=user filename,
/// `F`=format, `b`=size, `t`=time) plus any named job-ticket field or
/// printcap option reachable via `${name}`.
#[derive(Debug, Clone, Default)]
pub struct ExpansionFields {
    pub printer: String,
    pub host: String,
    pub job_number: String,
    pub logname: String,
    pub user_filename: String,
    pub format: String,
    pub size: String,
    pub time: String,
    /// The flags string `$*` interpolates in place.
    pub flags: String,
    pub named: HashMap<String, String>,
}

impl ExpansionFields {
    fn lookup(&self, letter: char) -> Option<&str> {
        match letter {
            'P' => Some(&self.printer),
            'h' => Some(&self.host),
            'j' => Some(&self.job_number),
            'n' => Some(&self.logname),
            'f' => Some(&self.user_filename),
            'F' => Some(&self.format),
            'b' => Some(&self.size),
            't' => Some(&self.time),
            _ => None,
        }
    }

    fn named_lookup(&self, name: &str) -> Option<String> {
        if let Ok(letter) = name.parse::<char>() {
            if let Some(value) = self.lookup(letter) {
                return Some(value.to_string());
            }
        }
        self.named.get(name).cloned()
    }
}

/// Expand one argv token into zero, one, or two argv entries (spec §4.4).
/// A token whose key letter is unset (or unrecognized) expands to nothing
/// — callers build argv via `flat_map` over this, so it is simply
/// dropped rather than appearing as an empty string.
pub fn expand_token(token: &str, fields: &ExpansionFields) -> Vec<String> {
    if token == "$*" {
        return tokenize(&fields.flags);
    }
    if let Some(inner) = token.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        return match fields.named_lookup(inner) {
            Some(value) => vec![unescape(&value)],
            None => vec![],
        };
    }
    if let Some(letter) = single_char(token.strip_prefix("$0")) {
        return match fields.lookup(letter) {
            Some(value) => vec!["-".to_string() + &letter.to_string(), unescape(value)],
            None => vec![],
        };
    }
    if let Some(letter) = single_char(token.strip_prefix("$-")) {
        return match fields.lookup(letter) {
            Some(value) => vec![unescape(value)],
            None => vec![],
        };
    }
    if let Some(letter) = single_char(token.strip_prefix("$'")) {
        return match fields.lookup(letter) {
            Some(value) => vec![format!("'{}'", unescape(value))],
            None => vec![],
        };
    }
    if let Some(letter) = single_char(token.strip_prefix('$')) {
        return match fields.lookup(letter) {
            Some(value) => vec![format!("-{letter}{}", unescape(value))],
            None => vec![],
        };
    }
    vec![unescape(token)]
}

fn single_char(rest: Option<&str>) -> Option<char> {
    let rest = rest?;
    let mut chars = rest.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some(c)
}

/// Resolve backslash escapes: `\n`, `\r`, `\t`, and `\nnn` octal byte
/// values (spec §4.4).
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some('r') => {
                out.push('\r');
                chars.next();
            }
            Some('t') => {
                out.push('\t');
                chars.next();
            }
            Some(d) if d.is_digit(8) => {
                let mut octal = String::new();
                for _ in 0..3 {
                    match chars.peek() {
                        Some(d) if d.is_digit(8) => {
                            octal.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                if let Ok(byte) = u8::from_str_radix(&octal, 8) {
                    out.push(byte as char);
                }
            }
            _ => out.push('\\'),
        }
    }
    out
}
