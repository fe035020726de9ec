// SPDX-License-Identifier: MIT

//! `flowctl worker [--flows-dir DIR]`: run the worker
//! pool against the job queue, optionally registering every `schedule`d flow
//! found under `DIR` with the cron provider.

use crate::approval::PostgresApprovalGate;
use crate::registries;
use anyhow::{Context, Result};
use flowctl_core::Flow;
use flowctl_runner::{
    CronProvider, EngineConfig, FlowExecutionHandler, FlowRunner, PayloadHandler, StaticNodeResolver,
    StatusTracker, WorkerPool,
};
use flowctl_storage::{EventStream, JobQueue, StatusStore};
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub async fn run(pool: &PgPool, config: EngineConfig, flows_dir: Option<&Path>) -> Result<()> {
    let executors = registries::build_executor_registry();
    let transports = registries::build_transport_registry();
    let stream = EventStream::new(pool.clone());
    let status = StatusStore::new(pool.clone());
    let queue = JobQueue::new(pool.clone());
    let hooks = Arc::new(PostgresApprovalGate::new(pool.clone()));

    let max_retries = config.max_retries;
    let runner = Arc::new(FlowRunner::new(executors, transports, stream, hooks, config.clone()));
    let tracker = Arc::new(StatusTracker::new(runner, status));
    let handler: Arc<dyn PayloadHandler> = Arc::new(FlowExecutionHandler::new(tracker));

    let worker_pool = Arc::new(WorkerPool::new(queue.clone(), vec![handler], Default::default(), config));

    let mut cron = match flows_dir {
        Some(dir) => Some(register_schedules(dir, queue.clone(), max_retries).await?),
        None => None,
    };

    let shutdown = CancellationToken::new();
    let pool_task = {
        let worker_pool = worker_pool.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { worker_pool.run(shutdown).await })
    };

    if let Some(cron) = &cron {
        cron.start().await.context("starting cron provider")?;
    }

    tracing::info!("flowctl worker running; press ctrl-c to stop");
    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    tracing::info!("shutdown signal received, draining in-flight jobs");

    shutdown.cancel();
    pool_task.await.context("worker pool task panicked")?;
    if let Some(cron) = &mut cron {
        cron.shutdown().await.context("stopping cron provider")?;
    }
    Ok(())
}

async fn register_schedules(dir: &Path, queue: JobQueue, max_retries: i32) -> Result<CronProvider<StaticNodeResolver>> {
    let mut flows = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.with_context(|| format!("reading flows directory {}", dir.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_yaml = matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"));
        if !is_yaml {
            continue;
        }
        let contents = tokio::fs::read_to_string(&path).await.with_context(|| format!("reading {}", path.display()))?;
        let flow: Flow = serde_yaml_ng::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        if flow.schedule.is_some() {
            flows.push(flow);
        }
    }

    let nodes = flows.iter().flat_map(|f| f.actions.iter().flat_map(|a| a.on.iter().cloned())).collect();
    let resolver = Arc::new(StaticNodeResolver::new(nodes));
    let cron = CronProvider::new(queue, resolver, max_retries).await.context("constructing cron provider")?;
    for flow in flows {
        let id = flow.id.clone();
        cron.register(flow).await.with_context(|| format!("registering schedule for flow '{id}'"))?;
    }
    Ok(cron)
}
