// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn parse_tcp_address_splits_host_and_port() {
    assert_eq!(parse_tcp_address("localhost:8080").unwrap(), ("localhost", 8080));
}

#[test]
fn parse_tcp_address_splits_on_last_colon_for_ipv6_literals() {
    assert_eq!(parse_tcp_address("::1:2375").unwrap(), ("::1", 2375));
}

#[test]
fn parse_tcp_address_rejects_missing_colon() {
    assert_eq!(parse_tcp_address("localhost").unwrap_err(), "address must be host:port");
}

#[test]
fn parse_tcp_address_rejects_non_numeric_port() {
    assert_eq!(parse_tcp_address("localhost:docker").unwrap_err(), "invalid port");
}

#[test]
fn parse_tcp_address_rejects_empty_port() {
    assert_eq!(parse_tcp_address("localhost:").unwrap_err(), "invalid port");
}

#[test]
fn default_host_key_policy_is_insecure_accept_any() {
    assert!(matches!(SshHostKeyPolicy::default(), SshHostKeyPolicy::InsecureAcceptAny));
}
