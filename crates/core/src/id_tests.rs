// SPDX-License-Identifier: MIT

use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId("tst-");
}

#[test]
fn define_id_hash_map_lookup() {
    let id = TestId::new();
    let mut map = HashMap::new();
    map.insert(id, 42);
    assert_eq!(map.get(id.as_str()), Some(&42));
}

#[test]
fn define_id_has_prefix() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn define_id_suffix_strips_prefix() {
    let id = TestId::new();
    assert!(!id.suffix().starts_with("tst-"));
    assert_eq!(id.suffix().len(), 19);
}

#[test]
fn define_id_short_truncates() {
    let id = TestId::from_string("tst-abcdefghijklmnopqrs");
    assert_eq!(id.short(4), "abcd");
}

#[test]
fn define_id_from_string_roundtrip() {
    let id = TestId::from_string("tst-abc");
    assert_eq!(id.to_string(), "tst-abc");
    let id2: TestId = "tst-abc".into();
    assert_eq!(id, id2);
}

#[test]
fn define_id_display_matches_as_str() {
    let id = TestId::new();
    assert_eq!(id.to_string(), id.as_str());
}

#[test]
fn short_fn_on_str() {
    let s = "abcdefghijklmnop";
    assert_eq!(short(s, 8), "abcdefgh");
    assert_eq!(short(s, 100), s);
    assert_eq!(short("abc", 8), "abc");
}
