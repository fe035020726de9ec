// SPDX-License-Identifier: MIT

//! Error types for executors and the executor registry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("unknown executor: {0}")]
    UnknownExecutor(String),

    #[error("{executor}: invalid `with` config: {source}")]
    InvalidConfig {
        executor: &'static str,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("action exited with non-zero status: {0}")]
    NonZeroExit(i64),

    #[error(transparent)]
    Driver(#[from] flowctl_driver::DriverError),

    #[error("docker api error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
