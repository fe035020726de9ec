// SPDX-License-Identifier: MIT

//! `KEY=VALUE` parser/serializer for executor output files.
//!
//! Executors write results and artifact manifests as dotenv-style files
//! under `FC_OUTPUT`/`FC_ARTIFACTS`. Quoting follows POSIX shell rules:
//! single quotes are literal, double quotes support `\" \\ \n` escapes, and
//! unquoted values stop at the first unescaped newline. Only the first `=`
//! splits key from value, so `=` is allowed unescaped inside values.

use std::collections::BTreeMap;

/// Parse a dotenv-format buffer into an ordered map.
///
/// Blank lines and lines starting with `#` (after leading whitespace) are
/// skipped. Malformed lines (no `=`) are ignored rather than rejected.
pub fn parse(input: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let mut chars = input.chars().peekable();
    loop {
        skip_blank_and_comment_lines(&mut chars);
        if chars.peek().is_none() {
            break;
        }
        let Some(key) = take_key(&mut chars) else { break };
        if key.trim().is_empty() {
            continue;
        }
        let value = take_value(&mut chars);
        out.insert(key, value);
    }
    out
}

fn skip_blank_and_comment_lines(chars: &mut std::iter::Peekable<std::str::Chars>) {
    loop {
        let mut lookahead = chars.clone();
        let mut only_ws = true;
        let mut saw_hash = false;
        while let Some(&c) = lookahead.peek() {
            if c == '\n' {
                break;
            }
            if c == '#' && only_ws {
                saw_hash = true;
                break;
            }
            if !c.is_whitespace() {
                only_ws = false;
                if !saw_hash {
                    break;
                }
            }
            lookahead.next();
        }
        if saw_hash || (only_ws && lookahead.peek().is_some()) {
            while let Some(&c) = chars.peek() {
                chars.next();
                if c == '\n' {
                    break;
                }
            }
            continue;
        }
        break;
    }
}

fn take_key(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<String> {
    let mut key = String::new();
    loop {
        match chars.next() {
            None => return if key.is_empty() { None } else { Some(key) },
            Some('=') => return Some(key),
            Some('\n') => return None,
            Some(c) => key.push(c),
        }
    }
}

fn take_value(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    match chars.peek() {
        Some('\'') => {
            chars.next();
            let mut value = String::new();
            for c in chars.by_ref() {
                if c == '\'' {
                    break;
                }
                value.push(c);
            }
            consume_to_eol(chars);
            value
        }
        Some('"') => {
            chars.next();
            let mut value = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => match chars.next() {
                        Some('n') => value.push('\n'),
                        Some('"') => value.push('"'),
                        Some('\\') => value.push('\\'),
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                        }
                        None => value.push('\\'),
                    },
                    other => value.push(other),
                }
            }
            consume_to_eol(chars);
            value
        }
        _ => {
            let mut value = String::new();
            for c in chars.by_ref() {
                if c == '\n' {
                    break;
                }
                value.push(c);
            }
            value
        }
    }
}

fn consume_to_eol(chars: &mut std::iter::Peekable<std::str::Chars>) {
    for c in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

/// Serialize a map back into dotenv format, double-quoting any value that
/// contains a newline, quote, or backslash so `parse` round-trips it.
pub fn serialize(values: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in values {
        out.push_str(key);
        out.push('=');
        if needs_quoting(value) {
            out.push('"');
            for c in value.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    other => out.push(other),
                }
            }
            out.push('"');
        } else {
            out.push_str(value);
        }
        out.push('\n');
    }
    out
}

fn needs_quoting(value: &str) -> bool {
    // A leading quote character must be escaped too: `take_value` peeks at
    // the first byte to decide whether the value is single- or
    // double-quoted, so an unquoted value starting with `'` or `"` would be
    // misparsed as a quoted literal on the next read.
    value.is_empty() || value.contains(['\n', '"', '\\']) || value.starts_with(['\'', '"'])
}

#[cfg(test)]
#[path = "dotenv_tests.rs"]
mod tests;
