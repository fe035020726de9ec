// SPDX-License-Identifier: MIT

//! `flowctl cancel <exec-id>`: delete any pending/leased queue rows for the
//! exec-id and mark the execution `cancelled`.
//!
//! A lease held by a live worker in another process can't be interrupted
//! from here directly — that requires the
//! [`flowctl_runner::ExecCancelRegistry`] held by the worker process that
//! leased it. This command still removes the row so the execution cannot be
//! picked up again after the in-flight attempt ends.

use anyhow::{Context, Result};
use flowctl_core::{ExecId, ExecutionStatus};
use flowctl_storage::{JobQueue, StatusStore};
use sqlx::PgPool;

pub async fn run(pool: &PgPool, exec_id: ExecId) -> Result<()> {
    let queue = JobQueue::new(pool.clone());
    let removed = queue.cancel_by_exec_id(exec_id).await.context("cancelling queued job rows")?;

    let status = StatusStore::new(pool.clone());
    let Some(record) = status.get(exec_id).await.context("fetching execution status")? else {
        anyhow::bail!("no execution found for {exec_id}");
    };

    if record.status.is_terminal() {
        println!("execution {exec_id} already {}; removed {removed} queue row(s)", record.status);
        return Ok(());
    }

    if !record.status.can_transition_to(ExecutionStatus::Cancelled) {
        // Still `pending`: no worker ever leased it, so the state machine
        // has no direct pending -> cancelled edge. Removing
        // the queue row above is enough to keep it from ever running.
        println!("execution {exec_id} removed from queue before it started ({removed} row(s)); status stays '{}'", record.status);
        return Ok(());
    }

    status.transition(exec_id, ExecutionStatus::Cancelled, Some("cancelled via flowctl cancel")).await.context("marking execution cancelled")?;
    println!("execution {exec_id} cancelled; removed {removed} queue row(s)");
    Ok(())
}
