// SPDX-License-Identifier: MIT

//! Cron Provider: reads the set of flows carrying a
//! non-empty `schedule`, ticks them on a [`tokio_cron_scheduler::JobScheduler`],
//! and re-resolves every node reference in the flow just before each tick is
//! materialized into a job — deferred resolution so a node rename between
//! schedule registration and a given tick is reflected.

use crate::error::RunnerError;
use async_trait::async_trait;
use flowctl_core::{ExecId, Flow, FlowExecutionPayload, Node, TriggerType};
use flowctl_storage::JobQueue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

/// The (out-of-scope) namespace/node store, batch-queried by name just
/// before a scheduled tick is enqueued.
#[async_trait]
pub trait NodeResolver: Send + Sync {
    async fn resolve(&self, namespace_id: &str, names: &[&str]) -> Result<HashMap<String, Node>, RunnerError>;
}

/// A [`NodeResolver`] that resolves every name to the `Node` record already
/// inline in the flow being scheduled, unchanged. Stands in for a real
/// namespace store in contexts (tests, the `flowctl-cli` demo binary) that
/// have no such collaborator; a production embedder supplies one backed by
/// its own namespace/credential records.
pub struct StaticNodeResolver {
    nodes: HashMap<String, Node>,
}

impl StaticNodeResolver {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes: nodes.into_iter().map(|n| (n.name.clone(), n)).collect() }
    }

    /// Build a resolver from every node already referenced in `flow`'s
    /// actions, so re-resolution is a no-op round trip.
    pub fn from_flow(flow: &Flow) -> Self {
        let nodes = flow.actions.iter().flat_map(|a| a.on.iter().cloned()).collect();
        Self::new(nodes)
    }
}

#[async_trait]
impl NodeResolver for StaticNodeResolver {
    async fn resolve(&self, _namespace_id: &str, names: &[&str]) -> Result<HashMap<String, Node>, RunnerError> {
        let mut out = HashMap::with_capacity(names.len());
        for name in names {
            let node = self.nodes.get(*name).ok_or_else(|| RunnerError::UnknownNode((*name).to_string()))?;
            out.insert((*name).to_string(), node.clone());
        }
        Ok(out)
    }
}

/// The pre-enqueue hook: assign a fresh exec-id, batch-resolve
/// every node name referenced by the flow's actions, and substitute the
/// resolved records back in before the payload is built. Exposed as a free
/// function, independent of [`JobScheduler`] ticking, so its substitution
/// logic is unit-testable without a live scheduler.
pub async fn pre_enqueue(
    flow: &Flow,
    namespace_id: &str,
    resolver: &dyn NodeResolver,
) -> Result<FlowExecutionPayload, RunnerError> {
    let names: Vec<&str> = flow.referenced_node_names().into_iter().collect();
    let resolved = resolver.resolve(namespace_id, &names).await?;
    for name in &names {
        if !resolved.contains_key(*name) {
            return Err(RunnerError::UnknownNode((*name).to_string()));
        }
    }

    let mut flow = flow.clone();
    for action in &mut flow.actions {
        for node in &mut action.on {
            if let Some(fresh) = resolved.get(&node.name) {
                *node = fresh.clone();
            }
        }
    }

    Ok(FlowExecutionPayload {
        exec_id: ExecId::new(),
        flow,
        input: HashMap::new(),
        starting_action_idx: 0,
        namespace_id: namespace_id.to_string(),
        user_id: "scheduler".to_string(),
        trigger_type: TriggerType::Scheduled,
        secrets: HashMap::new(),
    })
}

/// Prepend a `0` seconds field when `expr` is a standard 5-field cron
/// expression, since `tokio-cron-scheduler`/the underlying `cron` crate
/// expect a seconds field. A `expr` that already carries 6+ fields is passed
/// through unchanged.
pub fn to_six_field_cron(expr: &str) -> String {
    if expr.split_whitespace().count() == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    }
}

async fn enqueue(queue: &JobQueue, payload: &FlowExecutionPayload, max_retries: i32) -> Result<(), RunnerError> {
    let bytes = serde_json::to_vec(payload)?;
    queue.put(payload.exec_id, crate::status_tracker::FLOW_EXECUTION_PAYLOAD_TYPE, bytes, None, max_retries).await?;
    Ok(())
}

/// Cron Provider: one [`JobScheduler`] shared across every
/// registered flow schedule.
pub struct CronProvider<R: NodeResolver + 'static> {
    scheduler: JobScheduler,
    queue: JobQueue,
    resolver: Arc<R>,
    max_retries: i32,
}

impl<R: NodeResolver + 'static> CronProvider<R> {
    pub async fn new(queue: JobQueue, resolver: Arc<R>, max_retries: i32) -> Result<Self, RunnerError> {
        let scheduler = JobScheduler::new().await.map_err(|e| RunnerError::Cron(e.to_string()))?;
        Ok(Self { scheduler, queue, resolver, max_retries })
    }

    /// Register `flow`'s `schedule` as a periodic enqueue task. Returns the
    /// scheduler's job id.
    pub async fn register(&self, flow: Flow) -> Result<Uuid, RunnerError> {
        let Some(cron_expr) = flow.schedule.clone() else {
            return Err(RunnerError::Cron(format!("flow {} has no schedule to register", flow.id)));
        };
        let six_field = to_six_field_cron(&cron_expr);
        six_field
            .parse::<croner::Cron>()
            .map_err(|error| RunnerError::Cron(format!("invalid schedule '{cron_expr}' for flow {}: {error}", flow.id)))?;

        let queue = self.queue.clone();
        let resolver = self.resolver.clone();
        let max_retries = self.max_retries;
        let namespace_id = flow.namespace.clone();

        let job = Job::new_async(six_field.as_str(), move |_job_id, _scheduler| {
            let queue = queue.clone();
            let resolver = resolver.clone();
            let flow = flow.clone();
            let namespace_id = namespace_id.clone();
            Box::pin(async move {
                match pre_enqueue(&flow, &namespace_id, resolver.as_ref()).await {
                    Ok(payload) => {
                        if let Err(error) = enqueue(&queue, &payload, max_retries).await {
                            tracing::error!(%error, flow_id = %flow.id, "failed to enqueue scheduled execution");
                        }
                    }
                    Err(error) => {
                        tracing::error!(%error, flow_id = %flow.id, "pre-enqueue node resolution failed");
                    }
                }
            })
        })
        .map_err(|e| RunnerError::Cron(e.to_string()))?;

        self.scheduler.add(job).await.map_err(|e| RunnerError::Cron(e.to_string()))
    }

    /// Start ticking every registered schedule.
    pub async fn start(&self) -> Result<(), RunnerError> {
        self.scheduler.start().await.map_err(|e| RunnerError::Cron(e.to_string()))
    }

    pub async fn shutdown(&mut self) -> Result<(), RunnerError> {
        self.scheduler.shutdown().await.map_err(|e| RunnerError::Cron(e.to_string()))
    }
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
