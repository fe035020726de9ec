// SPDX-License-Identifier: MIT

//! `flowctl approve <exec-id> <action-id>`: record the approval so the next
//! `before_action` hook call lets the action through, then re-enqueue with
//! `starting_action_idx` advanced to that action so earlier ones are not
//! re-run.

use crate::approval;
use anyhow::{Context, Result};
use flowctl_core::{ExecId, FlowExecutionPayload};
use flowctl_runner::FLOW_EXECUTION_PAYLOAD_TYPE;
use flowctl_storage::{JobQueue, StatusStore};
use sqlx::PgPool;

pub async fn run(pool: &PgPool, exec_id: ExecId, action_id: &str, max_retries: i32) -> Result<()> {
    approval::ensure_schema(pool).await.context("creating approvals table")?;
    approval::record_approval(pool, exec_id, action_id).await.context("recording approval")?;

    let status = StatusStore::new(pool.clone());
    let bytes = status.get_payload(exec_id).await.context("fetching execution payload")?;
    let Some(bytes) = bytes else {
        anyhow::bail!("no execution payload stored for {exec_id}");
    };
    let mut payload: FlowExecutionPayload = serde_json::from_slice(&bytes).context("deserializing execution payload")?;

    let idx = payload
        .flow
        .action(action_id)
        .and_then(|action| payload.flow.actions.iter().position(|a| a.id == action.id))
        .with_context(|| format!("action '{action_id}' not found in flow '{}'", payload.flow.id))?;
    payload.starting_action_idx = idx;

    let bytes = serde_json::to_vec(&payload).context("serializing resumed execution payload")?;
    let queue = JobQueue::new(pool.clone());
    queue.put(exec_id, FLOW_EXECUTION_PAYLOAD_TYPE, bytes, None, max_retries).await.context("re-enqueueing resumed execution")?;

    println!("execution {exec_id} re-enqueued, resuming from action '{action_id}' (index {idx})");
    Ok(())
}
