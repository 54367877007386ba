// SPDX-License-Identifier: MIT

//! `LineList`: an ordered sequence of strings, optionally kept sorted and
//! unique by a key prefix. Spec §4.1 — the universal "map with insertion
//! order on tie" container backing configuration, printcap entries, job
//! tickets, permission rules, and filter argv tokens.

use std::cmp::Ordering;

/// An ordered sequence of strings, optionally sorted+unique by a key prefix
/// terminated by one of a set of separator characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineList {
    lines: Vec<String>,
}

/// Result of a `lower_bound`-style key search: where the key would sit if
/// absent, plus whether it's actually present there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLookup {
    pub index: usize,
    pub found: bool,
}

fn key_of<'a>(line: &'a str, seps: &str) -> &'a str {
    match line.find(|c| seps.contains(c)) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn key_cmp_ci(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

impl LineList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    /// Append unconditionally, preserving insertion order.
    pub fn append(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Binary-search `lines` for `key` (compared case-insensitively up to
    /// the first character in `seps`), assuming `lines` is already sorted
    /// in that order. Returns the insertion point and whether an exact key
    /// match was found there.
    pub fn find_first_key(&self, key: &str, seps: &str) -> KeyLookup {
        let mut lo = 0usize;
        let mut hi = self.lines.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let mid_key = key_of(&self.lines[mid], seps);
            if key_cmp_ci(mid_key, key) == Ordering::Less {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let found = lo < self.lines.len() && key_cmp_ci(key_of(&self.lines[lo], seps), key) == Ordering::Equal;
        KeyLookup { index: lo, found }
    }

    /// Like [`Self::find_first_key`] but returns the index of the *last*
    /// matching entry when duplicates exist in an unsorted list (linear scan).
    pub fn find_last_key(&self, key: &str, seps: &str) -> KeyLookup {
        let mut result = KeyLookup {
            index: self.lines.len(),
            found: false,
        };
        for (i, line) in self.lines.iter().enumerate() {
            if key_cmp_ci(key_of(line, seps), key) == Ordering::Equal {
                result = KeyLookup {
                    index: i,
                    found: true,
                };
            }
        }
        result
    }

    /// Add a line, honoring `sort`/`uniq` semantics.
    ///
    /// When `sort` is true the list is kept in case-insensitive ascending
    /// order of the key prefix (up to any char in `seps`). When `uniq` is
    /// also true, an existing entry with the same key is replaced in place
    /// rather than duplicated.
    pub fn add(&mut self, line: impl Into<String>, seps: &str, sort: bool, uniq: bool) {
        let line = line.into();
        if !sort {
            if uniq {
                let key = key_of(&line, seps);
                if let Some(existing) = self
                    .lines
                    .iter()
                    .position(|l| key_cmp_ci(key_of(l, seps), key) == Ordering::Equal)
                {
                    self.lines[existing] = line;
                    return;
                }
            }
            self.lines.push(line);
            return;
        }

        let key = key_of(&line, seps).to_string();
        let lookup = self.find_first_key(&key, seps);
        if uniq && lookup.found {
            self.lines[lookup.index] = line;
        } else {
            self.lines.insert(lookup.index, line);
        }
    }

    pub fn remove(&mut self, idx: usize) -> Option<String> {
        if idx < self.lines.len() {
            Some(self.lines.remove(idx))
        } else {
            None
        }
    }

    /// Find a `key=value`/`key#value` entry case-sensitively and return its
    /// raw value substring (after the first `=` or `#`).
    pub fn find_str(&self, key: &str) -> Option<&str> {
        self.find_entry(key, false)
    }

    /// Case-insensitive variant of [`Self::find_str`].
    pub fn find_str_ci(&self, key: &str) -> Option<&str> {
        self.find_entry(key, true)
    }

    fn find_entry(&self, key: &str, ci: bool) -> Option<&str> {
        for line in &self.lines {
            let k = key_of(line, "=#@");
            let matches = if ci {
                key_cmp_ci(k, key) == Ordering::Equal
            } else {
                k == key
            };
            if matches {
                return line[k.len()..].strip_prefix(['=', '#']);
            }
        }
        None
    }

    /// Decode an integer-valued entry (`key#N` or `key=N`).
    pub fn find_int(&self, key: &str) -> Option<i64> {
        self.find_str(key)?.parse().ok()
    }

    /// Decode a flag entry: bare `key` present → `Some(true)`, `key@` →
    /// `Some(false)`, absent → `None`.
    pub fn find_flag(&self, key: &str) -> Option<bool> {
        for line in &self.lines {
            if let Some(rest) = line.strip_prefix(key) {
                if rest.is_empty() {
                    return Some(true);
                }
                if rest == "@" {
                    return Some(false);
                }
            }
        }
        None
    }

    /// Upsert a `key=value` string entry (sorted+unique semantics).
    pub fn set_str(&mut self, key: &str, value: &str) {
        self.add(format!("{key}={value}"), "=#@", true, true);
    }

    /// Upsert a `key#N` integer entry (sorted+unique semantics).
    pub fn set_int(&mut self, key: &str, n: i64) {
        self.add(format!("{key}#{n}"), "=#@", true, true);
    }

    /// Join all lines with `sep`.
    pub fn join(&self, sep: &str) -> String {
        self.lines.join(sep)
    }

    /// Split `src` on any character in `seps` into a `LineList`, honoring
    /// an escape-character list so that e.g. `\:` does not split on `:`,
    /// optional whitespace trimming, `#`-comment stripping, and
    /// sort/unique insertion.
    #[allow(clippy::too_many_arguments)]
    pub fn split(
        src: &str,
        seps: &str,
        sort: bool,
        key_seps: &str,
        uniq: bool,
        trim_whitespace: bool,
        nocomment: bool,
        escape_chars: &str,
    ) -> Self {
        let mut list = Self::new();
        let mut current = String::new();
        let mut chars = src.chars().peekable();
        let mut in_comment = false;

        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(&next) = chars.peek() {
                    if escape_chars.contains(next) {
                        current.push(next);
                        chars.next();
                        continue;
                    }
                }
                current.push(c);
                continue;
            }
            if nocomment && c == '#' && current.is_empty() {
                in_comment = true;
            }
            if in_comment {
                if c == '\n' {
                    in_comment = false;
                } else {
                    continue;
                }
            }
            if seps.contains(c) {
                Self::push_token(&mut list, &mut current, key_seps, sort, uniq, trim_whitespace);
            } else {
                current.push(c);
            }
        }
        Self::push_token(&mut list, &mut current, key_seps, sort, uniq, trim_whitespace);
        list
    }

    fn push_token(
        list: &mut Self,
        current: &mut String,
        key_seps: &str,
        sort: bool,
        uniq: bool,
        trim_whitespace: bool,
    ) {
        let token = if trim_whitespace {
            current.trim()
        } else {
            current.as_str()
        };
        if !token.is_empty() {
            list.add(token.to_string(), key_seps, sort, uniq);
        }
        current.clear();
    }
}

impl<'a> IntoIterator for &'a LineList {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, String>, fn(&'a String) -> &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_join_round_trips_when_entries_have_no_separator() {
        let list = LineList::split("a:b:c", ":", false, "=", false, false, false, "");
        assert_eq!(list.join(":"), "a:b:c");
    }

    #[test]
    fn split_honors_escape_chars() {
        let list = LineList::split(r"a\:b:c", ":", false, "=", false, false, false, ":");
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["a:b", "c"]);
    }

    #[test]
    fn sorted_uniq_add_replaces_existing_key() {
        let mut list = LineList::new();
        list.add("zebra=1", "=", true, true);
        list.add("apple=2", "=", true, true);
        list.add("apple=3", "=", true, true);
        assert_eq!(list.len(), 2);
        assert_eq!(list.find_str("apple"), Some("3"));
        // case-insensitive ascending order: apple before zebra
        assert_eq!(list.get(0), Some("apple=3"));
    }

    #[test]
    fn find_first_key_lower_bound_on_sorted_list() {
        let mut list = LineList::new();
        for k in ["apple", "mango", "zebra"] {
            list.add(format!("{k}=1"), "=", true, true);
        }
        let lookup = list.find_first_key("mango", "=");
        assert!(lookup.found);
        assert_eq!(lookup.index, 1);
        let missing = list.find_first_key("guava", "=");
        assert!(!missing.found);
        assert_eq!(missing.index, 1);
    }

    #[test]
    fn set_str_and_set_int_decode_back() {
        let mut list = LineList::new();
        list.set_str("lp", "/dev/null");
        list.set_int("mx", 0);
        assert_eq!(list.find_str("lp"), Some("/dev/null"));
        assert_eq!(list.find_int("mx"), Some(0));
    }

    #[test]
    fn find_flag_distinguishes_on_and_off() {
        let mut list = LineList::new();
        list.append("sh");
        list.append("rw@");
        assert_eq!(list.find_flag("sh"), Some(true));
        assert_eq!(list.find_flag("rw"), Some(false));
        assert_eq!(list.find_flag("missing"), None);
    }

    #[test]
    fn nocomment_strips_comment_lines() {
        let list = LineList::split("a\n#comment\nb", "\n", false, "=", false, true, true, "");
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn token() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9]{1,6}"
    }

    proptest! {
        /// `split(join(entries, sep), sep) == entries` (spec §8) when no
        /// entry itself contains the separator.
        #[test]
        fn split_join_round_trips(entries in proptest::collection::vec(token(), 0..8)) {
            let joined = entries.join(":");
            let list = LineList::split(&joined, ":", false, "=", false, false, false, "");
            prop_assert_eq!(list.iter().collect::<Vec<_>>(), entries.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
