// SPDX-License-Identifier: MIT

//! Environment-sourced engine configuration: the only
//! place in this workspace that reads `std::env`, via `clap`'s `derive` +
//! `env` features.

use clap::Args;
use flowctl_runner::EngineConfig;
use std::time::Duration;

#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Postgres connection string (job queue, status store, event stream).
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Number of concurrent workers polling the job queue.
    #[arg(long, env = "FLOWCTL_WORKER_COUNT")]
    pub worker_count: Option<usize>,

    /// Seconds between queue polls when no job is leasable.
    #[arg(long, env = "FLOWCTL_POLL_INTERVAL_SECS")]
    pub poll_interval_secs: Option<u64>,

    /// Per-action wall-clock timeout, in seconds.
    #[arg(long, env = "FLOWCTL_ACTION_TIMEOUT_SECS")]
    pub action_timeout_secs: Option<u64>,

    /// Default `max_retries` for newly-enqueued jobs.
    #[arg(long, env = "FLOWCTL_MAX_RETRIES")]
    pub max_retries: Option<i32>,
}

impl EngineArgs {
    pub fn to_engine_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            worker_count: self.worker_count.unwrap_or(defaults.worker_count),
            poll_interval: self.poll_interval_secs.map(Duration::from_secs).unwrap_or(defaults.poll_interval),
            action_timeout: self.action_timeout_secs.map(Duration::from_secs).unwrap_or(defaults.action_timeout),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            ..defaults
        }
    }
}
