// SPDX-License-Identifier: MIT

//! Error types for node drivers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{os:?} targets are not yet supported")]
    UnsupportedOs { os: flowctl_core::OsFamily },

    #[error("{op} on {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command exited with status {0}")]
    NonZeroExit(i32),

    #[error("command was cancelled")]
    Cancelled,

    #[error(transparent)]
    Transport(#[from] flowctl_transport::TransportError),
}

impl DriverError {
    pub fn io(op: &'static str, path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { op, path: path.into(), source }
    }
}
