// SPDX-License-Identifier: MIT

//! `flowctl trigger <flow.yaml>`: load a flow definition, build a manual
//! [`FlowExecutionPayload`], create its `pending` status row (manually
//! triggered runs normally have their row created by an HTTP layer; this
//! binary stands in for that layer), and enqueue it.

use anyhow::{Context, Result};
use flowctl_core::{ExecId, Flow, FlowExecutionPayload, TriggerType};
use flowctl_runner::FLOW_EXECUTION_PAYLOAD_TYPE;
use flowctl_storage::{JobQueue, StatusStore};
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::Path;

pub async fn run(
    pool: &PgPool,
    flow_path: &Path,
    inputs: &[(String, String)],
    secrets: &[(String, String)],
    max_retries: i32,
) -> Result<ExecId> {
    let yaml = std::fs::read_to_string(flow_path)
        .with_context(|| format!("reading flow definition {}", flow_path.display()))?;
    let flow: Flow = serde_yaml_ng::from_str(&yaml).context("parsing flow YAML")?;
    flow.validate().map_err(|errors| anyhow::anyhow!("flow failed validation: {errors:?}"))?;

    let input: HashMap<String, serde_json::Value> =
        inputs.iter().map(|(k, v)| (k.clone(), parse_input_value(v))).collect();
    let secrets: HashMap<String, String> = secrets.iter().cloned().collect();

    let exec_id = ExecId::new();
    let payload = FlowExecutionPayload {
        exec_id,
        namespace_id: flow.namespace.clone(),
        user_id: "cli".to_string(),
        trigger_type: TriggerType::Manual,
        starting_action_idx: 0,
        flow,
        input,
        secrets,
    };
    let bytes = serde_json::to_vec(&payload).context("serializing execution payload")?;

    let status = StatusStore::new(pool.clone());
    status
        .create(exec_id, &payload.namespace_id, &payload.flow.id, &payload.flow.name, payload.trigger_type, &bytes)
        .await
        .context("creating execution status row")?;

    let queue = JobQueue::new(pool.clone());
    queue.put(exec_id, FLOW_EXECUTION_PAYLOAD_TYPE, bytes, None, max_retries).await.context("enqueueing job")?;

    Ok(exec_id)
}

/// `NAME=VALUE` input values are parsed as JSON when they look like it
/// (numbers, booleans, arrays), and fall back to a plain string otherwise —
/// sparing callers from having to quote `--input name=world` as JSON.
fn parse_input_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}
