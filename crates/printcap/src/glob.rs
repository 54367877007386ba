// SPDX-License-Identifier: MIT

//! Minimal shell-style glob matcher for printer/alias name patterns (spec
//! §4.2 step 4 "partial-glob match"). Supports `*` (any run of characters)
//! and `?` (single character); no character classes.

pub fn has_wildcard(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

pub fn matches(pattern: &str, text: &str) -> bool {
    matches_bytes(pattern.as_bytes(), text.as_bytes())
}

fn matches_bytes(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some(b'*') => {
            matches_bytes(&pattern[1..], text)
                || (!text.is_empty() && matches_bytes(pattern, &text[1..]))
        }
        Some(b'?') => !text.is_empty() && matches_bytes(&pattern[1..], &text[1..]),
        Some(&c) => text.first() == Some(&c) && matches_bytes(&pattern[1..], &text[1..]),
    }
}
