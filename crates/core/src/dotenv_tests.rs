// SPDX-License-Identifier: MIT

use super::*;
use proptest::prelude::*;

#[test]
fn parses_simple_pairs() {
    let map = parse("FOO=bar\nBAZ=qux\n");
    assert_eq!(map.get("FOO").unwrap(), "bar");
    assert_eq!(map.get("BAZ").unwrap(), "qux");
}

#[test]
fn skips_blank_lines_and_comments() {
    let map = parse("# a comment\n\nFOO=bar\n  # indented comment\nBAZ=qux\n");
    assert_eq!(map.len(), 2);
}

#[test]
fn double_quoted_value_unescapes() {
    let map = parse("MSG=\"line one\\nline two\"\n");
    assert_eq!(map.get("MSG").unwrap(), "line one\nline two");
}

#[test]
fn single_quoted_value_is_literal() {
    let map = parse("MSG='no \\n escape here'\n");
    assert_eq!(map.get("MSG").unwrap(), "no \\n escape here");
}

#[test]
fn unquoted_value_stops_at_newline() {
    let map = parse("FOO=bar\nNEXT=baz\n");
    assert_eq!(map.get("FOO").unwrap(), "bar");
    assert_eq!(map.get("NEXT").unwrap(), "baz");
}

#[test]
fn bare_equals_in_value_does_not_split_again() {
    let map = parse("URL=http://example.com?a=b&c=d\n");
    assert_eq!(map.get("URL").unwrap(), "http://example.com?a=b&c=d");
}

#[test]
fn serialize_then_parse_round_trips_multiline_value() {
    let mut values = BTreeMap::new();
    values.insert("OUT".to_string(), "first\nsecond \"quoted\" \\ done".to_string());
    let text = serialize(&values);
    let parsed = parse(&text);
    assert_eq!(parsed, values);
}

#[test]
fn serialize_quotes_empty_value() {
    let mut values = BTreeMap::new();
    values.insert("EMPTY".to_string(), String::new());
    let text = serialize(&values);
    assert_eq!(text, "EMPTY=\"\"\n");
    assert_eq!(parse(&text).get("EMPTY").unwrap(), "");
}

#[test]
fn serialize_quotes_value_starting_with_single_quote() {
    // A bare leading `'` would otherwise serialize unquoted and then be
    // misread by `take_value` as the start of a single-quoted literal.
    let mut values = BTreeMap::new();
    values.insert("OUT".to_string(), "'x".to_string());
    let text = serialize(&values);
    assert_eq!(parse(&text).get("OUT").unwrap(), "'x");
}

#[test]
fn serialize_then_parse_round_trips_lone_single_quote() {
    let mut values = BTreeMap::new();
    values.insert("OUT".to_string(), "'".to_string());
    let text = serialize(&values);
    let parsed = parse(&text);
    assert_eq!(parsed, values);
}

proptest! {
    #[test]
    fn round_trip_arbitrary_values(
        key in "[A-Z][A-Z0-9_]{0,15}",
        value in ".{0,40}",
    ) {
        let mut values = BTreeMap::new();
        values.insert(key.clone(), value.clone());
        let text = serialize(&values);
        let parsed = parse(&text);
        prop_assert_eq!(parsed.get(&key), Some(&value));
    }
}
