// SPDX-License-Identifier: MIT

//! Execution identity and status state machine.

use crate::flow::Flow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Stable UUID identifying one run of a flow.
///
/// Unlike the short nanoid-prefixed ids elsewhere in this crate, exec-ids are
/// plain UUIDs end to end (stable UUID assigned at enqueue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecId(pub Uuid);

impl ExecId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExecId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ExecId {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

/// How the execution was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Manual,
    Scheduled,
}

/// State machine of an execution.
///
/// No transition leaves `Completed`, `Errored`, or `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    PendingApproval,
    Completed,
    Errored,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored | Self::Cancelled)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Pending, Running)
                | (Running, Completed)
                | (Running, Errored)
                | (Running, Cancelled)
                | (Running, PendingApproval)
                | (PendingApproval, Running)
        )
    }
}

crate::simple_display! {
    ExecutionStatus {
        Pending => "pending",
        Running => "running",
        PendingApproval => "pending_approval",
        Completed => "completed",
        Errored => "errored",
        Cancelled => "cancelled",
    }
}

/// The payload carried by a `flow_execution` job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowExecutionPayload {
    pub exec_id: ExecId,
    pub flow: Flow,
    pub input: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub starting_action_idx: usize,
    pub namespace_id: String,
    pub user_id: String,
    pub trigger_type: TriggerType,
    /// Namespace/flow secret map, already resolved by the (out-of-scope)
    /// secret-store integration before this payload was built — this engine
    /// never talks to Vault/SSM itself. Exposed to interpolation
    /// expressions as `secrets.<name>`.
    #[serde(default)]
    pub secrets: HashMap<String, String>,
}

impl FlowExecutionPayload {
    /// Clamp `starting_action_idx` into `[0, len(actions)]`.
    pub fn clamped_starting_idx(&self) -> usize {
        self.starting_action_idx.min(self.flow.actions.len())
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
