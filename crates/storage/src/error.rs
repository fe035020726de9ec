// SPDX-License-Identifier: MIT

//! Storage error kinds.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// No leasable job was found for the polled payload type. Sentinel,
    /// matched by identity via [`StorageError::is_no_jobs`].
    #[error("no jobs available")]
    NoJobs,

    /// The background task holding a job lease's transaction open vanished
    /// before acknowledging `complete`/`retry`/`abandon` — equivalent to the
    /// worker having crashed mid-lease.
    #[error("lease task ended before acknowledging its outcome")]
    LeaseTaskGone,

    #[error("invalid execution status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl StorageError {
    pub fn is_no_jobs(&self) -> bool {
        matches!(self, StorageError::NoJobs)
    }
}
