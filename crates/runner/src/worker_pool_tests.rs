// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn cancel_registry_cancel_reaches_a_registered_token() {
    let registry = ExecCancelRegistry::new();
    let exec_id = ExecId::new();
    let token = CancellationToken::new();
    registry.register(exec_id, token.clone());

    assert!(registry.cancel(exec_id));
    assert!(token.is_cancelled());
}

#[test]
fn cancel_registry_reports_unknown_exec_id() {
    let registry = ExecCancelRegistry::new();
    assert!(!registry.cancel(ExecId::new()));
}

#[test]
fn cancel_registry_forgets_after_unregister() {
    let registry = ExecCancelRegistry::new();
    let exec_id = ExecId::new();
    registry.register(exec_id, CancellationToken::new());
    registry.unregister(exec_id);
    assert!(!registry.cancel(exec_id));
}

/// The following tests exercise the full dispatch loop against a live
/// Postgres-backed [`JobQueue`]; skipped unless `DATABASE_URL` is set.
mod live {
    use super::*;
    use flowctl_storage::migrations;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn queue() -> Option<JobQueue> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new().max_connections(5).connect(&url).await.ok()?;
        migrations::run(&pool).await.ok()?;
        Some(JobQueue::new(pool))
    }

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
        outcome: RunnerError,
        succeed: bool,
    }

    #[async_trait]
    impl PayloadHandler for CountingHandler {
        fn payload_type(&self) -> &'static str {
            "counting"
        }

        async fn handle(&self, _exec_id: ExecId, _payload: &[u8], _cancel: CancellationToken) -> Result<(), RunnerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(())
            } else {
                Err(match &self.outcome {
                    RunnerError::PendingApproval => RunnerError::PendingApproval,
                    RunnerError::ExecutionCancelled => RunnerError::ExecutionCancelled,
                    _ => RunnerError::Io(std::io::Error::other("boom")),
                })
            }
        }
    }

    fn test_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.worker_count = 1;
        config.poll_interval = Duration::from_millis(20);
        config.max_retries = 0;
        config
    }

    #[tokio::test]
    #[ignore]
    async fn successful_job_is_completed_and_removed() {
        let Some(queue) = queue().await else { return };
        let exec_id = ExecId::new();
        queue.put(exec_id, "counting", b"{}".to_vec(), None, 0).await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let handler: Arc<dyn PayloadHandler> =
            Arc::new(CountingHandler { calls: calls.clone(), outcome: RunnerError::ExecutionCancelled, succeed: true });
        let pool = WorkerPool::new(queue.clone(), vec![handler], ExecCancelRegistry::new(), test_config());

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            shutdown_clone.cancel();
        });
        pool.run(shutdown).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let err = queue.get_by_payload_type("counting").await.unwrap_err();
        assert!(err.is_no_jobs());
    }

    #[tokio::test]
    #[ignore]
    async fn pending_approval_deletes_the_job_row() {
        let Some(queue) = queue().await else { return };
        let exec_id = ExecId::new();
        queue.put(exec_id, "counting", b"{}".to_vec(), None, 0).await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let handler: Arc<dyn PayloadHandler> =
            Arc::new(CountingHandler { calls, outcome: RunnerError::PendingApproval, succeed: false });
        let pool = WorkerPool::new(queue.clone(), vec![handler], ExecCancelRegistry::new(), test_config());

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            shutdown_clone.cancel();
        });
        pool.run(shutdown).await;

        let err = queue.get_by_payload_type("counting").await.unwrap_err();
        assert!(err.is_no_jobs());
    }

    #[tokio::test]
    #[ignore]
    async fn retryable_error_reschedules_instead_of_deleting() {
        let Some(queue) = queue().await else { return };
        let exec_id = ExecId::new();
        queue.put(exec_id, "counting", b"{}".to_vec(), None, 3).await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let handler: Arc<dyn PayloadHandler> =
            Arc::new(CountingHandler { calls: calls.clone(), outcome: RunnerError::Io(std::io::Error::other("x")), succeed: false });
        let mut config = test_config();
        config.retry_backoff_base = chrono::Duration::milliseconds(-1);
        let pool = WorkerPool::new(queue.clone(), vec![handler], ExecCancelRegistry::new(), config);

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            shutdown_clone.cancel();
        });
        pool.run(shutdown).await;

        // The row was retried at least once rather than deleted outright.
        assert!(calls.load(Ordering::SeqCst) >= 1);
        let lease = queue.get_by_payload_type("counting").await.unwrap();
        assert!(lease.job.attempt >= 1);
        lease.complete().await.unwrap();
    }
}
