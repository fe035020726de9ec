// SPDX-License-Identifier: MIT

//! Postgres-backed persistence: job queue, execution status, event stream.

pub mod error;
pub mod migrations;
pub mod queue;
pub mod status;
pub mod stream;

pub use error::StorageError;
pub use queue::{backoff, Job, JobLease, JobQueue, LeaseOutcome};
pub use status::{ExecutionRecord, StatusStore};
pub use stream::EventStream;
