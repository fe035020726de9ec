// SPDX-License-Identifier: MIT

//! Idempotent schema migrations.

use crate::error::StorageError;
use sqlx::PgPool;

/// Apply every migration under `migrations/` that has not yet run. Safe to
/// call on every process start; migrations are additive and
/// `IF NOT EXISTS`-guarded.
pub async fn run(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
