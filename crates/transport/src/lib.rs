// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flowctl-transport: pluggable remote-shell transports.
//!
//! A [`TransportRegistry`] maps connection-type strings to
//! [`RemoteClientFactory`] implementations. At least one SSH-family
//! transport ([`SshTransport`]) ships here; a second (multiplexed) variant
//! may be registered under a different key by an embedder without touching
//! this crate.

pub mod client;
pub mod error;
pub mod registry;
pub mod ssh;

pub use client::{DialStream, NodeConfig, RemoteClient, RemoteClientFactory};
pub use error::TransportError;
pub use registry::TransportRegistry;
pub use ssh::{SshHostKeyPolicy, SshTransport};
