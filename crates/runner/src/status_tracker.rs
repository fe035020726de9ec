// SPDX-License-Identifier: MIT

//! Status Tracker Middleware: wraps the Flow Runner handler,
//! creating the execution-log row for scheduled triggers and mapping the
//! handler's outcome onto the [`ExecutionStatus`] state machine.
//!
//! Also implements [`PayloadHandler`] for the `flow_execution` payload type,
//! so the worker pool can dispatch leased jobs straight into the tracked
//! runner without knowing about [`FlowExecutionPayload`] itself.

use crate::error::RunnerError;
use crate::flow_runner::FlowRunner;
use crate::hooks::ActionHooks;
use crate::worker_pool::PayloadHandler;
use async_trait::async_trait;
use flowctl_core::{ExecId, ExecutionStatus, FlowExecutionPayload, TriggerType};
use flowctl_storage::StatusStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The `payload_type` a [`FlowExecutionHandler`] registers under.
pub const FLOW_EXECUTION_PAYLOAD_TYPE: &str = "flow_execution";

/// Wraps a [`FlowRunner`], persisting status transitions around its run.
pub struct StatusTracker<H: ActionHooks> {
    runner: Arc<FlowRunner<H>>,
    status: StatusStore,
}

impl<H: ActionHooks> StatusTracker<H> {
    pub fn new(runner: Arc<FlowRunner<H>>, status: StatusStore) -> Self {
        Self { runner, status }
    }

    /// Run one execution under tracking.
    ///
    /// Manually-triggered executions already have their `pending` row
    /// created by the (out-of-scope) HTTP layer before the job is enqueued;
    /// scheduled executions do not, so this creates it here.
    pub async fn handle(&self, payload: &FlowExecutionPayload, cancel: &CancellationToken) -> Result<(), RunnerError> {
        if payload.trigger_type == TriggerType::Scheduled {
            let bytes = serde_json::to_vec(payload)?;
            self.status
                .create(payload.exec_id, &payload.namespace_id, &payload.flow.id, &payload.flow.name, payload.trigger_type, &bytes)
                .await?;
        }

        self.status.transition(payload.exec_id, ExecutionStatus::Running, None).await?;

        match self.runner.run(payload, cancel).await {
            Ok(()) => {
                self.status.transition(payload.exec_id, ExecutionStatus::Completed, None).await?;
                Ok(())
            }
            Err(error) if error.is_pending_approval() => {
                self.status.transition(payload.exec_id, ExecutionStatus::PendingApproval, None).await?;
                Err(error)
            }
            Err(error) if error.is_cancelled() => {
                self.status.transition(payload.exec_id, ExecutionStatus::Cancelled, None).await?;
                Err(error)
            }
            Err(error) => {
                self.status.transition(payload.exec_id, ExecutionStatus::Errored, Some(&error.to_string())).await?;
                Err(error)
            }
        }
    }
}

/// Adapts a [`StatusTracker`] to the worker pool's [`PayloadHandler`]
/// contract: deserialize the queue row's opaque payload bytes back into a
/// [`FlowExecutionPayload`] and hand it to the tracker.
pub struct FlowExecutionHandler<H: ActionHooks> {
    tracker: Arc<StatusTracker<H>>,
}

impl<H: ActionHooks> FlowExecutionHandler<H> {
    pub fn new(tracker: Arc<StatusTracker<H>>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl<H: ActionHooks + 'static> PayloadHandler for FlowExecutionHandler<H> {
    fn payload_type(&self) -> &'static str {
        FLOW_EXECUTION_PAYLOAD_TYPE
    }

    async fn handle(&self, _exec_id: ExecId, payload: &[u8], cancel: CancellationToken) -> Result<(), RunnerError> {
        let payload: FlowExecutionPayload = serde_json::from_slice(payload)?;
        self.tracker.handle(&payload, &cancel).await
    }
}

#[cfg(test)]
#[path = "status_tracker_tests.rs"]
mod tests;
