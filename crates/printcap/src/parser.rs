// SPDX-License-Identifier: MIT

//! Parsing raw printcap text into [`RawRecord`]s (spec §4.2 step 1-3).

use crate::entry::RawRecord;
use lpd_core::LineList;

/// Parse a complete printcap source into records, in file order. Blank
/// lines and `#`-comment lines are dropped; a line ending with `\` is
/// joined with the next line (spec §3: "Continuation lines end with `\`").
pub fn parse_source(src: &str) -> Vec<RawRecord> {
    join_continuations(src)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_record)
        .collect()
}

fn join_continuations(src: &str) -> String {
    let mut joined = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    let mut pending = String::new();

    while let Some(c) = chars.next() {
        if c == '\\' && matches!(chars.peek(), Some('\n')) {
            chars.next();
            continue;
        }
        pending.push(c);
        if c == '\n' {
            joined.push_str(&pending);
            pending.clear();
        }
    }
    joined.push_str(&pending);
    joined
}

fn parse_record(line: &str) -> RawRecord {
    let (name_field, rest) = match line.find(':') {
        Some(pos) => (&line[..pos], &line[pos + 1..]),
        None => (line, ""),
    };

    let mut names = name_field.split('|').map(str::to_string);
    let primary = names.next().unwrap_or_default();
    let aliases: Vec<String> = names.collect();

    let options = LineList::split(rest, ":", false, "=#@", false, true, false, ":");

    RawRecord {
        primary,
        aliases,
        options,
    }
}
