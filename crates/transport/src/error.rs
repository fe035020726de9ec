// SPDX-License-Identifier: MIT

//! Error types for the transport registry and SSH-family clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Lookup of an unregistered connection-type key.
    #[error("unknown transport: {0}")]
    UnknownTransport(String),

    #[error("unsupported auth method: {0}")]
    UnsupportedAuth(String),

    #[error("ssh handshake failed: {0}")]
    Handshake(String),

    #[error("ssh authentication rejected for user {user}")]
    AuthRejected { user: String },

    #[error("channel operation failed: {0}")]
    Channel(String),

    #[error("remote command exited with status {0}")]
    NonZeroExit(u32),

    #[error("dial failed for {network}:{address}: {source}")]
    Dial {
        network: &'static str,
        address: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
