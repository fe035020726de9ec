// SPDX-License-Identifier: MIT

//! The Flow Runner: walks a flow's actions in order,
//! interpolating variables and evaluating conditions against
//! `{input, secrets}`, fanning each action out across its target nodes, and
//! checkpointing every result to the stream logger as it lands.

use crate::config::EngineConfig;
use crate::error::RunnerError;
use crate::hooks::{ActionHooks, HookDecision};
use crate::interp;
use flowctl_core::{Action, ExecId, FlowExecutionPayload, Node, ResultMap, StreamMessage};
use flowctl_driver::new_node_driver;
use flowctl_executor::{ExecutionContext, ExecutorRegistry};
use flowctl_storage::EventStream;
use flowctl_transport::TransportRegistry;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Forwards synchronous [`std::io::Write`] calls from an executor into the
/// async [`EventStream`] as `log` records, decoupling the executor's
/// synchronous stdio contract from the stream logger's async storage write.
struct StreamWriter {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl io::Write for StreamWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx.send(buf.to_vec()).map_err(|_| io::Error::other("event stream writer task gone"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn spawn_stream_writer(stream: EventStream, exec_id: ExecId, action_id: String) -> StreamWriter {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        while let Some(bytes) = rx.recv().await {
            if let Err(error) = stream.write(exec_id, &action_id, bytes).await {
                tracing::warn!(%error, %exec_id, action_id = %action_id, "failed to persist stream log record");
            }
        }
    });
    StreamWriter { tx }
}

/// The Flow Runner.
pub struct FlowRunner<H: ActionHooks> {
    executors: ExecutorRegistry,
    transports: TransportRegistry,
    stream: EventStream,
    hooks: Arc<H>,
    config: EngineConfig,
}

impl<H: ActionHooks> FlowRunner<H> {
    pub fn new(
        executors: ExecutorRegistry,
        transports: TransportRegistry,
        stream: EventStream,
        hooks: Arc<H>,
        config: EngineConfig,
    ) -> Self {
        Self { executors, transports, stream, hooks, config }
    }

    /// Run (or resume, from `payload.starting_action_idx`) one execution.
    pub async fn run(&self, payload: &FlowExecutionPayload, cancel: &CancellationToken) -> Result<(), RunnerError> {
        if let Err(errors) = payload.flow.validate() {
            return Err(RunnerError::InvalidFlow(errors));
        }

        let artifact_dir = create_artifact_dir(payload.exec_id).await?;
        let context = interp::build_context(&payload.input, &payload.secrets);
        let start = payload.clamped_starting_idx();

        for idx in start..payload.flow.actions.len() {
            let action = &payload.flow.actions[idx];

            if cancel.is_cancelled() {
                self.stream
                    .checkpoint(
                        payload.exec_id,
                        StreamMessage::Cancelled {
                            action_id: action.id.clone(),
                            text: "execution cancelled before action started".into(),
                        },
                    )
                    .await?;
                return Err(RunnerError::ExecutionCancelled);
            }

            match self.hooks.before_action(payload.exec_id, action, &payload.namespace_id).await? {
                HookDecision::Proceed => {}
                HookDecision::PendingApproval { approval_id } => {
                    self.stream
                        .checkpoint(
                            payload.exec_id,
                            StreamMessage::Approval { action_id: action.id.clone(), approval_id },
                        )
                        .await?;
                    return Err(RunnerError::PendingApproval);
                }
            }

            // A prior run already checkpointed this action's result: adopt
            // it and move on rather than re-executing.
            if self.stream.result(payload.exec_id, &action.id).await?.is_some() {
                tracing::info!(exec_id = %payload.exec_id, action_id = %action.id, "adopting checkpointed result");
                self.hooks.after_action(payload.exec_id, action, &payload.namespace_id).await?;
                continue;
            }

            match self.run_action(payload.exec_id, action, &context, &artifact_dir, cancel).await {
                Ok(Some(result)) => {
                    self.stream
                        .checkpoint(payload.exec_id, StreamMessage::Result { action_id: action.id.clone(), value: result })
                        .await?;
                }
                Ok(None) => {
                    // condition evaluated false: record a skip, not a failure.
                    let skipped = ResultMap::from([("skipped".to_string(), "true".to_string())]);
                    self.stream
                        .checkpoint(payload.exec_id, StreamMessage::Result { action_id: action.id.clone(), value: skipped })
                        .await?;
                }
                Err(error) if cancel.is_cancelled() => {
                    self.stream
                        .checkpoint(
                            payload.exec_id,
                            StreamMessage::Cancelled { action_id: action.id.clone(), text: error.to_string() },
                        )
                        .await?;
                    return Err(RunnerError::ExecutionCancelled);
                }
                Err(error) => {
                    self.stream
                        .checkpoint(
                            payload.exec_id,
                            StreamMessage::Error { action_id: action.id.clone(), text: error.to_string() },
                        )
                        .await?;
                    return Err(error);
                }
            }

            self.hooks.after_action(payload.exec_id, action, &payload.namespace_id).await?;
        }

        Ok(())
    }

    /// Run one action: interpolate variables, evaluate the condition, fan
    /// out across its target nodes, and merge their results. `Ok(None)`
    /// means the condition skipped the action.
    async fn run_action(
        &self,
        exec_id: ExecId,
        action: &Action,
        context: &serde_json::Value,
        artifact_dir: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ResultMap>, RunnerError> {
        if let Some(condition) = &action.condition {
            let field = format!("actions[{}].condition", action.id);
            if !interp::evaluate_condition(&field, condition, context)? {
                return Ok(None);
            }
        }

        let mut inputs = HashMap::new();
        for var in &action.variables {
            let field = format!("actions[{}].variables.{}", action.id, var.name);
            inputs.insert(var.name.clone(), interp::interpolate(&field, &var.value, context)?);
        }

        let nodes: Vec<Option<Node>> =
            if action.is_local_only() { vec![None] } else { action.on.iter().cloned().map(Some).collect() };

        // A per-action child token: cancelling it (on timeout, or the first
        // node error) reaches every sibling node task without tearing down
        // the rest of the execution, while cancellation of the execution
        // still propagates down into it.
        let action_cancel = cancel.child_token();

        let mut handles = Vec::with_capacity(nodes.len());
        for node in nodes {
            let executors = self.executors.clone();
            let transports = self.transports.clone();
            let stream = self.stream.clone();
            let action = action.clone();
            let inputs = inputs.clone();
            let artifact_dir = artifact_dir.to_string();
            let node_cancel = action_cancel.clone();
            let timeout = self.config.action_timeout;

            handles.push(tokio::spawn(async move {
                run_on_node(exec_id, action, node, inputs, artifact_dir, executors, transports, stream, node_cancel, timeout)
                    .await
            }));
        }

        let mut merged = ResultMap::new();
        let mut first_error = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(partial)) => merged.extend(partial),
                Ok(Err(error)) => {
                    action_cancel.cancel();
                    first_error.get_or_insert(error);
                }
                Err(join_error) => {
                    action_cancel.cancel();
                    first_error.get_or_insert(RunnerError::Io(io::Error::other(join_error.to_string())));
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(Some(merged)),
        }
    }
}

async fn create_artifact_dir(exec_id: ExecId) -> Result<String, RunnerError> {
    let dir = std::env::temp_dir().join(format!("flowctl-artifacts-{exec_id}"));
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir.to_string_lossy().into_owned())
}

#[allow(clippy::too_many_arguments)]
async fn run_on_node(
    exec_id: ExecId,
    action: Action,
    node: Option<Node>,
    inputs: HashMap<String, String>,
    artifact_dir: String,
    executors: ExecutorRegistry,
    transports: TransportRegistry,
    stream: EventStream,
    cancel: CancellationToken,
    timeout: std::time::Duration,
) -> Result<ResultMap, RunnerError> {
    let node_label = node.as_ref().map(|n| n.name.clone()).unwrap_or_else(|| "local".to_string());
    let driver = new_node_driver(node.as_ref(), &transports).await?;
    let executor = executors.create(&action.executor, driver.clone())?;

    let mut stdout = spawn_stream_writer(stream.clone(), exec_id, action.id.clone());
    let mut stderr = spawn_stream_writer(stream, exec_id, action.id.clone());

    let ctx = ExecutionContext {
        with_config: &action.with,
        inputs: &inputs,
        artifacts: &action.artifacts,
        artifact_dir: &artifact_dir,
        node_name: node.as_ref().map(|n| n.name.as_str()),
        stdout: &mut stdout,
        stderr: &mut stderr,
        cancel: &cancel,
    };

    let outcome = tokio::time::timeout(timeout, executor.execute(ctx)).await;
    let _ = driver.close().await;

    match outcome {
        Err(_elapsed) => {
            cancel.cancel();
            Err(RunnerError::ActionTimedOut { action_id: action.id, node: node_label })
        }
        Ok(Err(source)) => Err(RunnerError::NodeFailed { action_id: action.id, node: node_label, source }),
        Ok(Ok(result)) => Ok(result),
    }
}

#[cfg(test)]
#[path = "flow_runner_tests.rs"]
mod tests;
