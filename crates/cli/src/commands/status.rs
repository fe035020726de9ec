// SPDX-License-Identifier: MIT

//! `flowctl status <exec-id>`: print the execution's status row and its
//! event stream.

use anyhow::{Context, Result};
use flowctl_core::ExecId;
use flowctl_storage::{EventStream, StatusStore};
use sqlx::PgPool;

pub async fn run(pool: &PgPool, exec_id: ExecId) -> Result<()> {
    let status = StatusStore::new(pool.clone());
    let record = status.get(exec_id).await.context("fetching execution status")?;
    let Some(record) = record else {
        anyhow::bail!("no execution found for {exec_id}");
    };

    println!("exec_id:      {}", record.exec_id);
    println!("flow:         {} ({})", record.flow_name, record.flow_id);
    println!("namespace:    {}", record.namespace_id);
    println!("trigger:      {:?}", record.trigger_type);
    println!("status:       {}", record.status);
    if let Some(message) = &record.error_message {
        println!("error:        {message}");
    }
    println!("created_at:   {}", record.created_at);
    println!("updated_at:   {}", record.updated_at);

    let stream = EventStream::new(pool.clone());
    let messages = stream.list(exec_id).await.context("fetching event stream")?;
    if messages.is_empty() {
        return Ok(());
    }

    println!("\nevent stream:");
    for message in messages {
        print_message(&message);
    }
    Ok(())
}

fn print_message(message: &flowctl_core::StreamMessage) {
    use flowctl_core::StreamMessage::*;
    match message {
        Log { action_id, bytes } => {
            println!("  [{action_id}] log: {}", String::from_utf8_lossy(bytes).trim_end());
        }
        Result { action_id, value } => println!("  [{action_id}] result: {value:?}"),
        Error { action_id, text } => println!("  [{action_id}] error: {text}"),
        Approval { action_id, approval_id } => println!("  [{action_id}] pending approval: {approval_id}"),
        Cancelled { action_id, text } => println!("  [{action_id}] cancelled: {text}"),
        Closed { action_id } => println!("  [{action_id}] closed"),
    }
}
