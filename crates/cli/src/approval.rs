// SPDX-License-Identifier: MIT

//! Standalone approval bookkeeping for `flowctl-cli`.
//!
//! [`flowctl_runner::InMemoryApprovalGate`] is fine for a single embedding
//! process, but `flowctl approve` runs as its own short-lived invocation of
//! this binary, so the gate it consults has to survive across processes.
//! This is demo tooling standing in for the out-of-scope approvals UI — a
//! real embedder backs `ActionHooks` with its own durable approval records,
//! never with this table.

use async_trait::async_trait;
use flowctl_core::{Action, ApprovalId, ExecId};
use flowctl_runner::{ActionHooks, HookDecision, RunnerError};
use sqlx::PgPool;

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS flowctl_cli_approvals (
            exec_id uuid NOT NULL,
            action_id text NOT NULL,
            approved_at timestamptz NOT NULL DEFAULT now(),
            PRIMARY KEY (exec_id, action_id)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn record_approval(pool: &PgPool, exec_id: ExecId, action_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO flowctl_cli_approvals (exec_id, action_id)
        VALUES ($1, $2)
        ON CONFLICT (exec_id, action_id) DO NOTHING
        "#,
    )
    .bind(exec_id.0)
    .bind(action_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// [`ActionHooks`] backed by [`flowctl_cli_approvals`], so an approval
/// recorded by one `flowctl approve` invocation is visible to whichever
/// `flowctl worker` process later reaches that action.
pub struct PostgresApprovalGate {
    pool: PgPool,
}

impl PostgresApprovalGate {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActionHooks for PostgresApprovalGate {
    async fn before_action(&self, exec_id: ExecId, action: &Action, _namespace_id: &str) -> Result<HookDecision, RunnerError> {
        if !action.approval {
            return Ok(HookDecision::Proceed);
        }
        let row: Option<(i32,)> = sqlx::query_as(
            r#"SELECT 1 FROM flowctl_cli_approvals WHERE exec_id = $1 AND action_id = $2"#,
        )
        .bind(exec_id.0)
        .bind(&action.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RunnerError::Io(std::io::Error::other(e.to_string())))?;

        if row.is_some() {
            return Ok(HookDecision::Proceed);
        }
        Ok(HookDecision::PendingApproval { approval_id: ApprovalId::new() })
    }

    async fn after_action(&self, _exec_id: ExecId, _action: &Action, _namespace_id: &str) -> Result<(), RunnerError> {
        Ok(())
    }
}
