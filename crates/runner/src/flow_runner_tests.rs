// SPDX-License-Identifier: MIT

//! Exercises the full flow runner against a live Postgres-backed
//! [`EventStream`] and the real script executor. Skipped unless
//! `DATABASE_URL` is set, matching
//! `flowctl-storage`'s `queue_tests::live` convention.

use super::*;
use crate::hooks::NoopHooks;
use flowctl_core::{Action, Flow, InputDef, OutputDef, TriggerType, Variable};
use flowctl_executor::{ScriptExecutorFactory, ScriptConfig};
use flowctl_storage::migrations;
use flowctl_transport::TransportRegistry;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;

async fn stream() -> Option<EventStream> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await.ok()?;
    migrations::run(&pool).await.ok()?;
    Some(EventStream::new(pool))
}

fn script_action(id: &str, script: &str, condition: Option<&str>, variables: Vec<Variable>) -> Action {
    let config = ScriptConfig {
        script: script.to_string(),
        interpreter: "/bin/bash".to_string(),
        extension: ".sh".to_string(),
    };
    Action {
        id: id.to_string(),
        name: id.to_string(),
        executor: "script".to_string(),
        with: serde_yaml_ng::to_value(&config).unwrap(),
        variables,
        approval: false,
        condition: condition.map(str::to_string),
        artifacts: Vec::new(),
        on: Vec::new(),
    }
}

fn flow(actions: Vec<Action>) -> Flow {
    Flow {
        id: "f".into(),
        name: "f".into(),
        schedule: None,
        namespace: "ns".into(),
        inputs: Vec::<InputDef>::new(),
        actions,
        outputs: Vec::<OutputDef>::new(),
    }
}

fn runner(stream: EventStream) -> FlowRunner<NoopHooks> {
    let executors = ExecutorRegistry::new();
    executors.register("script", std::sync::Arc::new(ScriptExecutorFactory));
    FlowRunner::new(executors, TransportRegistry::new(), stream, std::sync::Arc::new(NoopHooks), EngineConfig::default())
}

#[tokio::test]
#[ignore]
async fn single_local_action_runs_and_checkpoints_result() {
    let Some(stream) = stream().await else { return };
    let action = script_action("a", "echo GREETING=hi > $FC_OUTPUT", None, Vec::new());
    let payload = FlowExecutionPayload {
        exec_id: ExecId::new(),
        flow: flow(vec![action]),
        input: HashMap::new(),
        starting_action_idx: 0,
        namespace_id: "ns".into(),
        user_id: "u".into(),
        trigger_type: TriggerType::Manual,
        secrets: HashMap::new(),
    };

    let runner = runner(stream.clone());
    runner.run(&payload, &CancellationToken::new()).await.unwrap();

    let result = stream.result(payload.exec_id, "a").await.unwrap().unwrap();
    assert_eq!(result.get("GREETING"), Some(&"hi".to_string()));
}

#[tokio::test]
#[ignore]
async fn false_condition_skips_without_failing() {
    let Some(stream) = stream().await else { return };
    let action = script_action("a", "echo SHOULD_NOT_RUN=1 > $FC_OUTPUT", Some("input.go == true"), Vec::new());
    let mut input = HashMap::new();
    input.insert("go".to_string(), serde_json::json!(false));
    let payload = FlowExecutionPayload {
        exec_id: ExecId::new(),
        flow: flow(vec![action]),
        input,
        starting_action_idx: 0,
        namespace_id: "ns".into(),
        user_id: "u".into(),
        trigger_type: TriggerType::Manual,
        secrets: HashMap::new(),
    };

    let runner = runner(stream.clone());
    runner.run(&payload, &CancellationToken::new()).await.unwrap();

    let result = stream.result(payload.exec_id, "a").await.unwrap().unwrap();
    assert_eq!(result.get("skipped"), Some(&"true".to_string()));
}

#[tokio::test]
#[ignore]
async fn variable_interpolation_reaches_the_script_environment() {
    let Some(stream) = stream().await else { return };
    let variables = vec![Variable { name: "NAME".into(), value: "{{ input.name }}".into() }];
    let action = script_action("a", "echo OUT=$NAME > $FC_OUTPUT", None, variables);
    let mut input = HashMap::new();
    input.insert("name".to_string(), serde_json::json!("flowctl"));
    let payload = FlowExecutionPayload {
        exec_id: ExecId::new(),
        flow: flow(vec![action]),
        input,
        starting_action_idx: 0,
        namespace_id: "ns".into(),
        user_id: "u".into(),
        trigger_type: TriggerType::Manual,
        secrets: HashMap::new(),
    };

    let runner = runner(stream.clone());
    runner.run(&payload, &CancellationToken::new()).await.unwrap();

    let result = stream.result(payload.exec_id, "a").await.unwrap().unwrap();
    assert_eq!(result.get("OUT"), Some(&"flowctl".to_string()));
}

#[tokio::test]
#[ignore]
async fn nonzero_exit_is_surfaced_as_node_failed() {
    let Some(stream) = stream().await else { return };
    let action = script_action("a", "exit 7", None, Vec::new());
    let payload = FlowExecutionPayload {
        exec_id: ExecId::new(),
        flow: flow(vec![action]),
        input: HashMap::new(),
        starting_action_idx: 0,
        namespace_id: "ns".into(),
        user_id: "u".into(),
        trigger_type: TriggerType::Manual,
        secrets: HashMap::new(),
    };

    let runner = runner(stream.clone());
    let error = runner.run(&payload, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(error, RunnerError::NodeFailed { .. }));
}

#[tokio::test]
#[ignore]
async fn invalid_flow_is_rejected_before_anything_runs() {
    let Some(stream) = stream().await else { return };
    let dup = vec![script_action("a", "true", None, Vec::new()), script_action("a", "true", None, Vec::new())];
    let payload = FlowExecutionPayload {
        exec_id: ExecId::new(),
        flow: flow(dup),
        input: HashMap::new(),
        starting_action_idx: 0,
        namespace_id: "ns".into(),
        user_id: "u".into(),
        trigger_type: TriggerType::Manual,
        secrets: HashMap::new(),
    };

    let runner = runner(stream);
    let error = runner.run(&payload, &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(error, RunnerError::InvalidFlow(_)));
}

#[tokio::test]
#[ignore]
async fn resuming_past_a_checkpointed_action_skips_reexecution() {
    let Some(stream) = stream().await else { return };
    let actions = vec![
        script_action("a", "echo A=1 > $FC_OUTPUT", None, Vec::new()),
        script_action("b", "echo B=2 > $FC_OUTPUT", None, Vec::new()),
    ];
    let exec_id = ExecId::new();
    stream
        .checkpoint(exec_id, StreamMessage::Result { action_id: "a".into(), value: ResultMap::from([("A".to_string(), "stale".to_string())]) })
        .await
        .unwrap();

    let payload = FlowExecutionPayload {
        exec_id,
        flow: flow(actions),
        input: HashMap::new(),
        starting_action_idx: 0,
        namespace_id: "ns".into(),
        user_id: "u".into(),
        trigger_type: TriggerType::Manual,
        secrets: HashMap::new(),
    };

    let runner = runner(stream.clone());
    runner.run(&payload, &CancellationToken::new()).await.unwrap();

    let a = stream.result(exec_id, "a").await.unwrap().unwrap();
    assert_eq!(a.get("A"), Some(&"stale".to_string()));
    let b = stream.result(exec_id, "b").await.unwrap().unwrap();
    assert_eq!(b.get("B"), Some(&"2".to_string()));
}
