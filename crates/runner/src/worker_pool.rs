// SPDX-License-Identifier: MIT

//! Worker Pool: N cooperative workers polling the job queue
//! by payload type, each dispatching a leased job to its registered
//! [`PayloadHandler`] and resolving the lease once the handler returns.

use crate::config::EngineConfig;
use crate::error::RunnerError;
use async_trait::async_trait;
use flowctl_core::ExecId;
use flowctl_storage::{backoff, JobQueue};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// A handler for one `payload_type` of queue row.
#[async_trait]
pub trait PayloadHandler: Send + Sync {
    /// The `job_queue.payload_type` this handler registers under.
    fn payload_type(&self) -> &'static str;

    /// Run the deserialized payload. `cancel` fires on `CancelByExecID`
    /// (via [`ExecCancelRegistry::cancel`]) or on worker-pool shutdown.
    async fn handle(&self, exec_id: ExecId, payload: &[u8], cancel: CancellationToken) -> Result<(), RunnerError>;
}

/// Tracks a live [`CancellationToken`] per in-flight exec-id so an external
/// `CancelByExecID` can reach a worker mid-handler even though the job row
/// it leased has already been deleted.
#[derive(Clone, Default)]
pub struct ExecCancelRegistry {
    tokens: Arc<RwLock<HashMap<ExecId, CancellationToken>>>,
}

impl ExecCancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, exec_id: ExecId, token: CancellationToken) {
        self.tokens.write().insert(exec_id, token);
    }

    fn unregister(&self, exec_id: ExecId) {
        self.tokens.write().remove(&exec_id);
    }

    /// Cancel the in-flight execution, if some worker currently holds it.
    /// Returns `false` if no worker currently has `exec_id` leased (it may
    /// already be done, or still only a pending row removed by
    /// `CancelByExecID` at the queue level).
    pub fn cancel(&self, exec_id: ExecId) -> bool {
        match self.tokens.read().get(&exec_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// N cooperative workers polling [`JobQueue::get_by_payload_type`] across
/// every registered handler's payload type in round-robin.
pub struct WorkerPool {
    queue: JobQueue,
    handlers: HashMap<&'static str, Arc<dyn PayloadHandler>>,
    cancel_registry: ExecCancelRegistry,
    config: EngineConfig,
}

impl WorkerPool {
    pub fn new(
        queue: JobQueue,
        handlers: Vec<Arc<dyn PayloadHandler>>,
        cancel_registry: ExecCancelRegistry,
        config: EngineConfig,
    ) -> Self {
        let handlers = handlers.into_iter().map(|h| (h.payload_type(), h)).collect();
        Self { queue, handlers, cancel_registry, config }
    }

    pub fn cancel_registry(&self) -> ExecCancelRegistry {
        self.cancel_registry.clone()
    }

    /// Run `config.worker_count` workers until `shutdown` fires. In-flight
    /// jobs are given `config.shutdown_grace` to unwind once cancellation
    /// reaches them.
    pub async fn run(&self, shutdown: CancellationToken) {
        let payload_types: Vec<&'static str> = self.handlers.keys().copied().collect();
        if payload_types.is_empty() {
            tracing::warn!("worker pool started with no registered payload handlers");
            return;
        }

        let mut workers = Vec::with_capacity(self.config.worker_count);
        for worker_id in 0..self.config.worker_count {
            let queue = self.queue.clone();
            let handlers = self.handlers.clone();
            let payload_types = payload_types.clone();
            let cancel_registry = self.cancel_registry.clone();
            let config = self.config.clone();
            let shutdown = shutdown.clone();
            let span = tracing::info_span!("worker", worker_id);

            workers.push(tokio::spawn(
                async move { worker_loop(worker_id, queue, handlers, payload_types, cancel_registry, config, shutdown).await }
                    .instrument(span),
            ));
        }

        for worker in workers {
            if let Err(error) = worker.await {
                tracing::error!(%error, "worker task panicked");
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    worker_id: usize,
    queue: JobQueue,
    handlers: HashMap<&'static str, Arc<dyn PayloadHandler>>,
    payload_types: Vec<&'static str>,
    cancel_registry: ExecCancelRegistry,
    config: EngineConfig,
    shutdown: CancellationToken,
) {
    let mut next = 0usize;
    while !shutdown.is_cancelled() {
        let payload_type = payload_types[next % payload_types.len()];
        next = next.wrapping_add(1);

        match queue.get_by_payload_type(payload_type).await {
            Ok(lease) => dispatch(&handlers, lease, &cancel_registry, &config, &shutdown).await,
            Err(error) if error.is_no_jobs() => {
                tokio::select! {
                    _ = tokio::time::sleep(config.poll_interval) => {}
                    _ = shutdown.cancelled() => break,
                }
            }
            Err(error) => {
                tracing::warn!(%error, worker_id, payload_type, "failed to poll job queue");
                tokio::time::sleep(config.poll_interval).await;
            }
        }
    }
}

async fn dispatch(
    handlers: &HashMap<&'static str, Arc<dyn PayloadHandler>>,
    lease: flowctl_storage::JobLease,
    cancel_registry: &ExecCancelRegistry,
    config: &EngineConfig,
    shutdown: &CancellationToken,
) {
    let job = lease.job.clone();

    let Some(handler) = handlers.get(job.payload_type.as_str()).cloned() else {
        tracing::error!(payload_type = %job.payload_type, job_id = job.id, "no handler registered for payload type");
        if let Err(error) = lease.abandon().await {
            tracing::error!(%error, job_id = job.id, "failed to abandon job with unknown payload type");
        }
        return;
    };

    let exec_cancel = shutdown.child_token();
    cancel_registry.register(job.exec_id, exec_cancel.clone());

    let result = handler.handle(job.exec_id, &job.payload, exec_cancel.clone()).await;
    cancel_registry.unregister(job.exec_id);

    let outcome = match &result {
        Ok(()) => lease.complete().await,
        Err(error) if error.is_pending_approval() || error.is_cancelled() => {
            // Both are terminal from the queue's point of view: approval
            // suspends the execution and deletes the job row until a later
            // re-enqueue with an advanced starting index; cancellation ends
            // it outright.
            lease.complete().await
        }
        Err(error) if error.is_retryable() && job.attempt < job.max_retries => {
            let delay = backoff(job.attempt, config.retry_backoff_base);
            lease.retry(delay).await
        }
        Err(_) => lease.complete().await,
    };

    if let Err(error) = outcome {
        tracing::error!(%error, job_id = job.id, "failed to finalize job lease");
    }
    if let Err(error) = result {
        if !error.is_pending_approval() && !error.is_cancelled() {
            tracing::warn!(%error, exec_id = %job.exec_id, "execution handler returned an error");
        }
    }
}

#[cfg(test)]
#[path = "worker_pool_tests.rs"]
mod tests;
