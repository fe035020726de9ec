// SPDX-License-Identifier: MIT

//! The [`Executor`] contract: turn an action's typed config +
//! inputs into a child process or container and collect its outputs.

use crate::error::ExecutorError;
use async_trait::async_trait;
use flowctl_core::ResultMap;
use std::collections::HashMap;
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// Everything an [`Executor`] needs for one invocation on one target node.
pub struct ExecutionContext<'a> {
    /// Opaque `with` block, still YAML-encoded; each executor decodes it
    /// into its own typed config struct.
    pub with_config: &'a serde_yaml_ng::Value,
    /// Action inputs, exported as environment variables.
    pub inputs: &'a HashMap<String, String>,
    /// Artifact paths to collect after a successful run.
    pub artifacts: &'a [String],
    /// Shared per-execution artifact directory the runner pushes/pulls
    /// through.
    pub artifact_dir: &'a str,
    /// Node name, if running against a named target; `None` for the
    /// implicit local node.
    pub node_name: Option<&'a str>,
    pub stdout: &'a mut (dyn Write + Send),
    pub stderr: &'a mut (dyn Write + Send),
    /// Cancellation for the whole execution; fires on `CancelByExecID` or
    /// executor-pool shutdown. Docker kills the container with
    /// a 10s grace; the script executor kills the remote/local process.
    pub cancel: &'a CancellationToken,
}

#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, ctx: ExecutionContext<'_>) -> Result<ResultMap, ExecutorError>;
}
