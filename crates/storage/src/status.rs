// SPDX-License-Identifier: MIT

//! Execution status store: one row per execution,
//! transitions validated against [`ExecutionStatus::can_transition_to`]
//! before they ever reach the database.

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use flowctl_core::{ExecId, ExecutionStatus, TriggerType};
use sqlx::{FromRow, PgPool};

/// A row in `execution_status`.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub exec_id: ExecId,
    pub namespace_id: String,
    pub flow_id: String,
    pub flow_name: String,
    pub trigger_type: TriggerType,
    pub status: ExecutionStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct ExecutionRow {
    exec_id: uuid::Uuid,
    namespace_id: String,
    flow_id: String,
    flow_name: String,
    trigger_type: String,
    status: String,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExecutionRow> for ExecutionRecord {
    type Error = StorageError;

    fn try_from(row: ExecutionRow) -> Result<Self, Self::Error> {
        Ok(ExecutionRecord {
            exec_id: ExecId(row.exec_id),
            namespace_id: row.namespace_id,
            flow_id: row.flow_id,
            flow_name: row.flow_name,
            trigger_type: parse_trigger_type(&row.trigger_type)?,
            status: parse_status(&row.status)?,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn trigger_type_str(t: TriggerType) -> &'static str {
    match t {
        TriggerType::Manual => "manual",
        TriggerType::Scheduled => "scheduled",
    }
}

fn parse_trigger_type(s: &str) -> Result<TriggerType, StorageError> {
    match s {
        "manual" => Ok(TriggerType::Manual),
        "scheduled" => Ok(TriggerType::Scheduled),
        other => Err(StorageError::InvalidTransition { from: other.to_string(), to: "<trigger_type>".into() }),
    }
}

fn status_str(s: ExecutionStatus) -> &'static str {
    match s {
        ExecutionStatus::Pending => "pending",
        ExecutionStatus::Running => "running",
        ExecutionStatus::PendingApproval => "pending_approval",
        ExecutionStatus::Completed => "completed",
        ExecutionStatus::Errored => "errored",
        ExecutionStatus::Cancelled => "cancelled",
    }
}

fn parse_status(s: &str) -> Result<ExecutionStatus, StorageError> {
    match s {
        "pending" => Ok(ExecutionStatus::Pending),
        "running" => Ok(ExecutionStatus::Running),
        "pending_approval" => Ok(ExecutionStatus::PendingApproval),
        "completed" => Ok(ExecutionStatus::Completed),
        "errored" => Ok(ExecutionStatus::Errored),
        "cancelled" => Ok(ExecutionStatus::Cancelled),
        other => Err(StorageError::InvalidTransition { from: other.to_string(), to: "<status>".into() }),
    }
}

/// Postgres-backed execution status store.
#[derive(Clone)]
pub struct StatusStore {
    pool: PgPool,
}

impl StatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the initial `Pending` row for a freshly-enqueued execution,
    /// snapshotting the `FlowExecutionPayload` it was enqueued with so a
    /// later approval resume can rebuild it without needing
    /// its own payload-snapshot store.
    pub async fn create(
        &self,
        exec_id: ExecId,
        namespace_id: &str,
        flow_id: &str,
        flow_name: &str,
        trigger_type: TriggerType,
        payload: &[u8],
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO execution_status (exec_id, namespace_id, flow_id, flow_name, trigger_type, status, payload)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(exec_id.0)
        .bind(namespace_id)
        .bind(flow_id)
        .bind(flow_name)
        .bind(trigger_type_str(trigger_type))
        .bind(status_str(ExecutionStatus::Pending))
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The `FlowExecutionPayload` bytes this execution was last (re-)enqueued
    /// with, used to resume a run after an approval is granted.
    pub async fn get_payload(&self, exec_id: ExecId) -> Result<Option<Vec<u8>>, StorageError> {
        let row: Option<(Vec<u8>,)> =
            sqlx::query_as(r#"SELECT payload FROM execution_status WHERE exec_id = $1"#)
                .bind(exec_id.0)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(payload,)| payload))
    }

    pub async fn get(&self, exec_id: ExecId) -> Result<Option<ExecutionRecord>, StorageError> {
        let row: Option<ExecutionRow> = sqlx::query_as(
            r#"
            SELECT exec_id, namespace_id, flow_id, flow_name, trigger_type, status, error_message, created_at, updated_at
            FROM execution_status
            WHERE exec_id = $1
            "#,
        )
        .bind(exec_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    /// Validate `current -> next` via [`ExecutionStatus::can_transition_to`]
    /// and persist it, clearing or setting `error_message` as appropriate.
    pub async fn transition(
        &self,
        exec_id: ExecId,
        next: ExecutionStatus,
        error_message: Option<&str>,
    ) -> Result<(), StorageError> {
        let current = self
            .get(exec_id)
            .await?
            .ok_or_else(|| StorageError::InvalidTransition { from: "<missing>".into(), to: status_str(next).into() })?
            .status;

        if !current.can_transition_to(next) {
            return Err(StorageError::InvalidTransition {
                from: status_str(current).into(),
                to: status_str(next).into(),
            });
        }

        sqlx::query(
            r#"
            UPDATE execution_status
            SET status = $2, error_message = $3, updated_at = now()
            WHERE exec_id = $1
            "#,
        )
        .bind(exec_id.0)
        .bind(status_str(next))
        .bind(error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// List executions for a namespace, most recent first.
    pub async fn list_for_namespace(
        &self,
        namespace_id: &str,
        limit: i64,
    ) -> Result<Vec<ExecutionRecord>, StorageError> {
        let rows: Vec<ExecutionRow> = sqlx::query_as(
            r#"
            SELECT exec_id, namespace_id, flow_id, flow_name, trigger_type, status, error_message, created_at, updated_at
            FROM execution_status
            WHERE namespace_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(namespace_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
