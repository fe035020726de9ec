// SPDX-License-Identifier: MIT

use super::*;
use flowctl_core::{Action, ExecId};

fn action(id: &str, approval: bool) -> Action {
    Action {
        id: id.to_string(),
        name: id.to_string(),
        executor: "script".to_string(),
        with: serde_yaml_ng::Value::Null,
        variables: Vec::new(),
        approval,
        condition: None,
        artifacts: Vec::new(),
        on: Vec::new(),
    }
}

#[tokio::test]
async fn noop_hooks_always_proceed() {
    let hooks = NoopHooks;
    let decision = hooks.before_action(ExecId::new(), &action("a", true), "ns").await.unwrap();
    assert!(matches!(decision, HookDecision::Proceed));
}

#[tokio::test]
async fn gate_proceeds_when_action_does_not_require_approval() {
    let gate = InMemoryApprovalGate::new();
    let decision = gate.before_action(ExecId::new(), &action("a", false), "ns").await.unwrap();
    assert!(matches!(decision, HookDecision::Proceed));
}

#[tokio::test]
async fn gate_suspends_unapproved_action() {
    let gate = InMemoryApprovalGate::new();
    let decision = gate.before_action(ExecId::new(), &action("a", true), "ns").await.unwrap();
    assert!(matches!(decision, HookDecision::PendingApproval { .. }));
}

#[tokio::test]
async fn gate_proceeds_after_approval() {
    let gate = InMemoryApprovalGate::new();
    let exec_id = ExecId::new();
    gate.approve(exec_id, "a");
    let decision = gate.before_action(exec_id, &action("a", true), "ns").await.unwrap();
    assert!(matches!(decision, HookDecision::Proceed));
}

#[tokio::test]
async fn approval_for_one_exec_does_not_leak_to_another() {
    let gate = InMemoryApprovalGate::new();
    gate.approve(ExecId::new(), "a");
    let decision = gate.before_action(ExecId::new(), &action("a", true), "ns").await.unwrap();
    assert!(matches!(decision, HookDecision::PendingApproval { .. }));
}
