// SPDX-License-Identifier: MIT

//! Action hooks: a pluggable `onBeforeAction`/
//! `onAfterAction` pair the flow runner calls around every action.
//!
//! This models the before/after hook contract as a typed [`HookDecision`] —
//! the runner still raises [`crate::error::RunnerError::PendingApproval`] up
//! to the status tracker, so the outer behavior is unchanged, but the hook
//! trait itself never has to abuse `Err` to signal a legitimate suspend.

use crate::error::RunnerError;
use async_trait::async_trait;
use flowctl_core::{Action, ApprovalId, ExecId};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Outcome of `before_action`.
pub enum HookDecision {
    /// Run the action now.
    Proceed,
    /// Suspend the execution; resumed once `approval_id` is approved out of
    /// band.
    PendingApproval { approval_id: ApprovalId },
}

#[async_trait]
pub trait ActionHooks: Send + Sync {
    async fn before_action(
        &self,
        exec_id: ExecId,
        action: &Action,
        namespace_id: &str,
    ) -> Result<HookDecision, RunnerError>;

    async fn after_action(
        &self,
        exec_id: ExecId,
        action: &Action,
        namespace_id: &str,
    ) -> Result<(), RunnerError>;
}

/// Every action proceeds immediately; no approval gate, no audit callback.
pub struct NoopHooks;

#[async_trait]
impl ActionHooks for NoopHooks {
    async fn before_action(&self, _exec_id: ExecId, _action: &Action, _namespace_id: &str) -> Result<HookDecision, RunnerError> {
        Ok(HookDecision::Proceed)
    }

    async fn after_action(&self, _exec_id: ExecId, _action: &Action, _namespace_id: &str) -> Result<(), RunnerError> {
        Ok(())
    }
}

/// Minimal in-process approval gate: actions with `approval: true` suspend
/// until [`InMemoryApprovalGate::approve`] is called for the same
/// `(exec_id, action_id)` pair.
///
/// This is standalone `flowctl-cli` tooling, not a core
/// data model concern — a real embedder backs this with its own durable
/// approval/audit records and never needs this type.
pub struct InMemoryApprovalGate {
    approved: Mutex<HashSet<(ExecId, String)>>,
}

impl InMemoryApprovalGate {
    pub fn new() -> Self {
        Self { approved: Mutex::new(HashSet::new()) }
    }

    /// Record that `action_id` within `exec_id` has been approved. Calling
    /// this before the action is ever reached pre-authorizes it.
    pub fn approve(&self, exec_id: ExecId, action_id: &str) {
        self.approved.lock().insert((exec_id, action_id.to_string()));
    }
}

impl Default for InMemoryApprovalGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionHooks for InMemoryApprovalGate {
    async fn before_action(&self, exec_id: ExecId, action: &Action, _namespace_id: &str) -> Result<HookDecision, RunnerError> {
        if !action.approval {
            return Ok(HookDecision::Proceed);
        }
        let key = (exec_id, action.id.clone());
        if self.approved.lock().contains(&key) {
            return Ok(HookDecision::Proceed);
        }
        Ok(HookDecision::PendingApproval { approval_id: ApprovalId::new() })
    }

    async fn after_action(&self, _exec_id: ExecId, _action: &Action, _namespace_id: &str) -> Result<(), RunnerError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
