// SPDX-License-Identifier: MIT

//! Engine configuration. Plain struct with sane
//! defaults; `flowctl-cli` is the only caller that reads it from the
//! environment (via `clap`'s `env` feature), keeping this crate free of any
//! direct dependency on `std::env` or a config-file format.

use std::time::Duration;

/// Tunables for the worker pool, cron provider, and flow runner.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of concurrent workers polling the job queue.
    pub worker_count: usize,
    /// Delay between polls when [`flowctl_storage::StorageError::is_no_jobs`]
    /// is returned.
    pub poll_interval: Duration,
    /// Hard wall-clock bound per action across all of its nodes; exceeding
    /// it cancels the action and fails it.
    pub action_timeout: Duration,
    /// Base delay for [`flowctl_storage::backoff`].
    pub retry_backoff_base: chrono::Duration,
    /// Default `max_retries` for newly-enqueued jobs.
    pub max_retries: i32,
    /// How long a worker waits for its in-flight job to finish before
    /// abandoning the lease on shutdown.
    pub shutdown_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            poll_interval: Duration::from_secs(1),
            action_timeout: Duration::from_secs(3600),
            retry_backoff_base: chrono::Duration::seconds(1),
            max_retries: 5,
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism().map(std::num::NonZeroUsize::get).unwrap_or(1)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
