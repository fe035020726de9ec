// SPDX-License-Identifier: MIT

//! Shared error kinds used across the workspace.
//!
//! Sentinel conditions (`PendingApproval`, `ExecutionCancelled`, `NoJobs`) are
//! distinct variants so callers match on them with `matches!`/`if let` rather
//! than string comparison.

use thiserror::Error;

/// Errors a flow execution (or a sub-operation of one) can produce.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Raised by an `on_before_action` hook to suspend the execution for
    /// human approval. Caught by the status tracker, never surfaced as a
    /// generic failure.
    #[error("execution suspended pending approval")]
    PendingApproval,

    /// Raised when `CancelByExecId` interrupts an in-flight execution.
    #[error("execution cancelled")]
    ExecutionCancelled,

    /// No leasable job was found for the polled payload type.
    #[error("no jobs available")]
    NoJobs,

    #[error("unknown executor: {0}")]
    UnknownExecutor(String),

    #[error("unknown transport: {0}")]
    UnknownTransport(String),

    #[error("unsupported auth method: {0}")]
    UnsupportedAuth(String),

    #[error("validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("action exited with non-zero status: {0}")]
    NonZeroExit(i64),

    #[error("{op} failed: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FlowError {
    pub fn io(op: &'static str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        FlowError::Io { op, source: Box::new(source) }
    }

    /// Sentinel errors are matched by identity, never string compare.
    pub fn is_pending_approval(&self) -> bool {
        matches!(self, FlowError::PendingApproval)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FlowError::ExecutionCancelled)
    }

    /// Whether a retry should be attempted for this error. Only IO errors
    /// from a transient operation are retried; validation and non-zero-exit
    /// are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FlowError::Io { .. })
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
