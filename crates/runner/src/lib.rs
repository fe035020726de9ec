// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flowctl-runner: the Flow Runner, Worker Pool, Cron Provider, and Status
//! Tracker middleware plus the expression evaluator
//! (condition + interpolation) they share.

pub mod config;
pub mod cron;
pub mod error;
pub mod flow_runner;
pub mod hooks;
pub mod interp;
pub mod status_tracker;
pub mod worker_pool;

pub use config::EngineConfig;
pub use cron::{pre_enqueue, CronProvider, NodeResolver, StaticNodeResolver};
pub use error::RunnerError;
pub use flow_runner::FlowRunner;
pub use hooks::{ActionHooks, HookDecision, InMemoryApprovalGate, NoopHooks};
pub use status_tracker::{FlowExecutionHandler, StatusTracker, FLOW_EXECUTION_PAYLOAD_TYPE};
pub use worker_pool::{ExecCancelRegistry, PayloadHandler, WorkerPool};
