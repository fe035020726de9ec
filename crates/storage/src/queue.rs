// SPDX-License-Identifier: MIT

//! Durable job queue: `job_queue` table, lease-by-lock via
//! `FOR UPDATE SKIP LOCKED`, retry-with-backoff, and exec-scoped
//! cancellation.
//!
//! The lease mechanics follow this workspace's repository pattern (a struct
//! wrapping `PgPool`, hand-rolled `FromRow` row structs converted into their
//! domain type), adapted from a CRUD table shape into a queue.

use crate::error::StorageError;
use chrono::{DateTime, Utc};
use flowctl_core::ExecId;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tokio::sync::oneshot;
use uuid::Uuid;

/// A queue row.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: i64,
    pub exec_id: ExecId,
    pub payload_type: String,
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub attempt: i32,
    pub max_retries: i32,
}

#[derive(FromRow)]
struct JobRow {
    id: i64,
    exec_id: Uuid,
    payload_type: String,
    payload: Vec<u8>,
    created_at: DateTime<Utc>,
    scheduled_at: Option<DateTime<Utc>>,
    attempt: i32,
    max_retries: i32,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            exec_id: ExecId(row.exec_id),
            payload_type: row.payload_type,
            payload: row.payload,
            created_at: row.created_at,
            scheduled_at: row.scheduled_at,
            attempt: row.attempt,
            max_retries: row.max_retries,
        }
    }
}

/// What to do with a leased job once the handler has finished with it.
pub enum LeaseOutcome {
    /// Handler succeeded: delete the row — a job row exists iff the
    /// execution is not yet terminal.
    Complete,
    /// Handler returned a transient error and `attempt < max_retries`:
    /// delete and re-insert with `scheduled_at = now + delay`, same payload,
    /// `attempt + 1`.
    Retry { delay: chrono::Duration },
    /// Release the lease without deleting the row — used when a worker
    /// notices cooperative shutdown mid-handler; the row becomes leasable
    /// again, exactly like a crash.
    Abandon,
}

enum LeaseMessage {
    Outcome(LeaseOutcome),
    /// Sent by `JobLease::drop` if the holder never explicitly decided —
    /// equivalent to the worker crashing, whose transaction rollback
    /// releases the row lock the same way.
    Abandon,
}

/// An exclusive claim on one job row, held open by a database transaction
/// for as long as `self` lives.
pub struct JobLease {
    pub job: Job,
    message_tx: Option<oneshot::Sender<LeaseMessage>>,
    ack_rx: oneshot::Receiver<Result<(), StorageError>>,
}

impl JobLease {
    async fn finish(mut self, outcome: LeaseOutcome) -> Result<(), StorageError> {
        let Some(tx) = self.message_tx.take() else {
            return Err(StorageError::LeaseTaskGone);
        };
        let _ = tx.send(LeaseMessage::Outcome(outcome));
        self.ack_rx.await.map_err(|_| StorageError::LeaseTaskGone)?
    }

    pub async fn complete(self) -> Result<(), StorageError> {
        self.finish(LeaseOutcome::Complete).await
    }

    pub async fn retry(self, delay: chrono::Duration) -> Result<(), StorageError> {
        self.finish(LeaseOutcome::Retry { delay }).await
    }

    pub async fn abandon(self) -> Result<(), StorageError> {
        self.finish(LeaseOutcome::Abandon).await
    }
}

impl Drop for JobLease {
    fn drop(&mut self) {
        if let Some(tx) = self.message_tx.take() {
            tracing::warn!(job_id = self.job.id, "job lease dropped without an explicit outcome, abandoning");
            let _ = tx.send(LeaseMessage::Abandon);
        }
    }
}

/// Postgres-backed job queue.
#[derive(Clone)]
pub struct JobQueue {
    pool: PgPool,
}

impl JobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new job row, returning its id.
    pub async fn put(
        &self,
        exec_id: ExecId,
        payload_type: &str,
        payload: Vec<u8>,
        scheduled_at: Option<DateTime<Utc>>,
        max_retries: i32,
    ) -> Result<i64, StorageError> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO job_queue (exec_id, payload_type, payload, scheduled_at, max_retries)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(exec_id.0)
        .bind(payload_type)
        .bind(payload)
        .bind(scheduled_at)
        .bind(max_retries)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    /// Atomically lease the oldest eligible job for `payload_type`. The
    /// returned [`JobLease`] holds its transaction open until
    /// [`JobLease::complete`]/[`JobLease::retry`]/[`JobLease::abandon`] is
    /// called (or it is dropped, which abandons it).
    pub async fn get_by_payload_type(&self, payload_type: &str) -> Result<JobLease, StorageError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<JobRow> = sqlx::query_as(
            r#"
            SELECT id, exec_id, payload_type, payload, created_at, scheduled_at, attempt, max_retries
            FROM job_queue
            WHERE payload_type = $1 AND (scheduled_at IS NULL OR scheduled_at <= NOW())
            ORDER BY created_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(payload_type)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(StorageError::NoJobs);
        };
        let job: Job = row.into();

        let (message_tx, message_rx) = oneshot::channel::<LeaseMessage>();
        let (ack_tx, ack_rx) = oneshot::channel::<Result<(), StorageError>>();
        let held_job = job.clone();

        tokio::spawn(async move {
            let outcome = match message_rx.await {
                Ok(LeaseMessage::Outcome(outcome)) => outcome,
                Ok(LeaseMessage::Abandon) | Err(_) => LeaseOutcome::Abandon,
            };
            let result = apply_outcome(tx, &held_job, outcome).await;
            let _ = ack_tx.send(result);
        });

        Ok(JobLease { job, message_tx: Some(message_tx), ack_rx })
    }

    /// Delete every row for `exec_id` (user-initiated cancellation or
    /// approval rejection). Blocks until any currently-leased row for this
    /// exec-id releases its row lock.
    pub async fn cancel_by_exec_id(&self, exec_id: ExecId) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM job_queue WHERE exec_id = $1")
            .bind(exec_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: i64) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM job_queue WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    pub fn close(&self) {
        self.pool.close_event().listen();
    }
}

async fn apply_outcome(
    mut tx: Transaction<'static, Postgres>,
    job: &Job,
    outcome: LeaseOutcome,
) -> Result<(), StorageError> {
    match outcome {
        LeaseOutcome::Complete => {
            sqlx::query("DELETE FROM job_queue WHERE id = $1").bind(job.id).execute(&mut *tx).await?;
            tx.commit().await?;
        }
        LeaseOutcome::Retry { delay } => {
            let scheduled_at = Utc::now() + delay;
            sqlx::query("DELETE FROM job_queue WHERE id = $1").bind(job.id).execute(&mut *tx).await?;
            sqlx::query(
                r#"
                INSERT INTO job_queue (exec_id, payload_type, payload, scheduled_at, attempt, max_retries)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(job.exec_id.0)
            .bind(&job.payload_type)
            .bind(&job.payload)
            .bind(scheduled_at)
            .bind(job.attempt + 1)
            .bind(job.max_retries)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
        }
        LeaseOutcome::Abandon => {
            tx.rollback().await?;
        }
    }
    Ok(())
}

/// Capped exponential backoff for job retries:
/// `base * 2^attempt`, capped at 5 minutes.
pub fn backoff(attempt: i32, base: chrono::Duration) -> chrono::Duration {
    let capped_attempt = attempt.clamp(0, 16);
    let factor = 1i64.checked_shl(capped_attempt as u32).unwrap_or(i64::MAX);
    let scaled = base
        .num_milliseconds()
        .checked_mul(factor)
        .map(chrono::Duration::milliseconds)
        .unwrap_or(chrono::Duration::max_value());
    let cap = chrono::Duration::minutes(5);
    if scaled > cap {
        cap
    } else {
        scaled
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
