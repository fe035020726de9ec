// SPDX-License-Identifier: MIT

//! Stream Logger: an append-only, per-exec-id message log
//! persisted in Postgres, fanned out live to subscribers via a broadcast
//! channel so the HTTP layer's WebSocket can forward records as they are
//! written.

use crate::error::StorageError;
use flowctl_core::{ExecId, ResultMap, StreamMessage};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

const CHANNEL_CAPACITY: usize = 256;

#[derive(FromRow)]
struct EventRow {
    value: serde_json::Value,
}

#[derive(FromRow)]
struct ResultRow {
    value: serde_json::Value,
}

/// Postgres-backed event stream with live fan-out.
#[derive(Clone)]
pub struct EventStream {
    pool: PgPool,
    subscribers: Arc<RwLock<HashMap<ExecId, broadcast::Sender<StreamMessage>>>>,
}

impl EventStream {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, subscribers: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Subscribe to live records for `exec_id`. Late subscribers only see
    /// records written after they subscribe; callers that need history
    /// should call [`EventStream::list`] first.
    pub async fn subscribe(&self, exec_id: ExecId) -> broadcast::Receiver<StreamMessage> {
        let mut subs = self.subscribers.write().await;
        subs.entry(exec_id).or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0).subscribe()
    }

    /// Persist `message` and publish it to any live subscribers.
    pub async fn checkpoint(&self, exec_id: ExecId, message: StreamMessage) -> Result<(), StorageError> {
        let message_type = message_type_str(&message);
        let action_id = message.action_id().to_string();
        let value = serde_json::to_value(&message).map_err(StorageError::from)?;

        sqlx::query(
            r#"
            INSERT INTO event_stream (exec_id, action_id, message_type, value)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(exec_id.0)
        .bind(&action_id)
        .bind(message_type)
        .bind(&value)
        .execute(&self.pool)
        .await?;

        if let StreamMessage::Result { action_id, value } = &message {
            sqlx::query(
                r#"
                INSERT INTO action_result (exec_id, action_id, value)
                VALUES ($1, $2, $3)
                ON CONFLICT (exec_id, action_id) DO NOTHING
                "#,
            )
            .bind(exec_id.0)
            .bind(action_id)
            .bind(serde_json::to_value(value).map_err(StorageError::from)?)
            .execute(&self.pool)
            .await?;
        }

        let subs = self.subscribers.read().await;
        if let Some(tx) = subs.get(&exec_id) {
            // No subscribers is not an error; drop the message.
            let _ = tx.send(message);
        }
        Ok(())
    }

    /// Shorthand for a raw-bytes `log` checkpoint.
    pub async fn write(&self, exec_id: ExecId, action_id: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        self.checkpoint(exec_id, StreamMessage::Log { action_id: action_id.to_string(), bytes }).await
    }

    /// Prior result for `action_id`, if any, used for checkpoint/resume.
    pub async fn result(&self, exec_id: ExecId, action_id: &str) -> Result<Option<ResultMap>, StorageError> {
        let row: Option<ResultRow> = sqlx::query_as(
            r#"SELECT value FROM action_result WHERE exec_id = $1 AND action_id = $2"#,
        )
        .bind(exec_id.0)
        .bind(action_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(serde_json::from_value(row.value).map_err(StorageError::from)?)),
            None => Ok(None),
        }
    }

    /// All records for `exec_id` in write order.
    pub async fn list(&self, exec_id: ExecId) -> Result<Vec<StreamMessage>, StorageError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"SELECT value FROM event_stream WHERE exec_id = $1 ORDER BY id ASC"#,
        )
        .bind(exec_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row.value).map_err(StorageError::from))
            .collect()
    }

    /// Write the terminal `closed` marker and drop the subscriber channel.
    pub async fn close(&self, exec_id: ExecId, close_id: &str) -> Result<(), StorageError> {
        self.checkpoint(exec_id, StreamMessage::Closed { action_id: close_id.to_string() }).await?;
        self.subscribers.write().await.remove(&exec_id);
        Ok(())
    }
}

fn message_type_str(message: &StreamMessage) -> &'static str {
    match message {
        StreamMessage::Log { .. } => "log",
        StreamMessage::Result { .. } => "result",
        StreamMessage::Error { .. } => "error",
        StreamMessage::Approval { .. } => "approval",
        StreamMessage::Cancelled { .. } => "cancelled",
        StreamMessage::Closed { .. } => "closed",
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
