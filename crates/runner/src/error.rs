// SPDX-License-Identifier: MIT

//! Error types for the Flow Runner, Status Tracker, Worker Pool, and Cron
//! Provider.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    /// Raised by [`crate::hooks::ActionHooks::before_action`] to suspend the
    /// execution for human approval.
    /// Caught by the status tracker, never surfaced as a generic failure.
    #[error("execution suspended pending approval")]
    PendingApproval,

    /// Raised when cancellation interrupts an in-flight execution.
    #[error("execution cancelled")]
    ExecutionCancelled,

    #[error("no jobs available")]
    NoJobs,

    #[error("action {action_id} references unknown executor: {executor}")]
    UnknownExecutor { action_id: String, executor: String },

    #[error("expression evaluation failed for {field}: {source}")]
    Expression {
        field: String,
        #[source]
        source: jexl_eval::error::EvaluationError,
    },

    #[error("condition did not evaluate to a boolean: {field}")]
    NonBooleanCondition { field: String },

    #[error("action {action_id} failed on node {node}: {source}")]
    NodeFailed {
        action_id: String,
        node: String,
        #[source]
        source: flowctl_executor::ExecutorError,
    },

    /// The action's per-node fan-out did not finish within
    /// [`crate::config::EngineConfig::action_timeout`].
    #[error("action {action_id} timed out on node {node}")]
    ActionTimedOut { action_id: String, node: String },

    #[error("flow failed validation: {0:?}", .0)]
    InvalidFlow(Vec<flowctl_core::FlowError>),

    #[error(transparent)]
    Executor(#[from] flowctl_executor::ExecutorError),

    #[error(transparent)]
    Driver(#[from] flowctl_driver::DriverError),

    #[error(transparent)]
    Storage(#[from] flowctl_storage::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("payload (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("cron scheduling error: {0}")]
    Cron(String),

    #[error("flow references unknown node: {0}")]
    UnknownNode(String),
}

impl RunnerError {
    pub fn is_pending_approval(&self) -> bool {
        matches!(self, RunnerError::PendingApproval)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunnerError::ExecutionCancelled)
    }

    /// Whether a queue-level retry should be attempted: only
    /// transient infrastructure failures, never validation or a non-zero
    /// script exit.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RunnerError::Io(_) | RunnerError::Driver(_) | RunnerError::Storage(_) | RunnerError::ActionTimedOut { .. }
        )
    }
}
