// SPDX-License-Identifier: MIT

//! Conventions shared by every executor:
//!
//! - a scratch output file bound as `/tmp/flow/output`, parsed as dotenv on
//!   completion;
//! - a scratch artifacts directory bound as `/tmp/flow/artifacts`;
//! - action inputs exported as environment variables, plus `FC_OUTPUT` and
//!   `FC_ARTIFACTS` pointing at the two paths above.

use crate::error::ExecutorError;
use flowctl_core::ResultMap;
use flowctl_driver::NodeDriver;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Container-visible bind-mount targets. Both local (driver-exec) and
/// Docker executors honor the same paths so scripts behave identically
/// either way.
pub const CONTAINER_OUTPUT_PATH: &str = "/tmp/flow/output";
pub const CONTAINER_ARTIFACTS_PATH: &str = "/tmp/flow/artifacts";

/// Build the environment map passed to the child process: action inputs
/// plus `FC_OUTPUT`/`FC_ARTIFACTS`.
pub fn build_env(inputs: &HashMap<String, String>) -> HashMap<String, String> {
    let mut env = inputs.clone();
    env.insert("FC_OUTPUT".to_string(), CONTAINER_OUTPUT_PATH.to_string());
    env.insert("FC_ARTIFACTS".to_string(), CONTAINER_ARTIFACTS_PATH.to_string());
    env
}

/// Parse the raw bytes of a completed output file as dotenv.
pub fn parse_output(bytes: &[u8]) -> ResultMap {
    let text = String::from_utf8_lossy(bytes);
    flowctl_core::dotenv::parse(&text).into_iter().collect()
}

/// Push the shared artifact directory into the executor's artifact area
/// before the action runs, so an action can read artifacts a prior action
/// left in `artifact_dir`. A missing `artifact_dir` (no artifacts produced
/// yet) is not an error.
pub async fn push_artifacts(
    driver: &dyn NodeDriver,
    artifact_dir: &str,
    remote_artifacts_dir: &str,
    cancel: &CancellationToken,
) -> Result<(), ExecutorError> {
    if tokio::fs::metadata(artifact_dir).await.is_err() {
        return Ok(());
    }
    for local_path in list_files_recursive(artifact_dir).await? {
        let relative = local_path.strip_prefix(artifact_dir).unwrap_or(&local_path).trim_start_matches('/');
        let remote_path = driver.join(&[remote_artifacts_dir, relative]);
        driver.upload(&local_path, &remote_path, cancel).await?;
    }
    Ok(())
}

async fn list_files_recursive(root: &str) -> Result<Vec<String>, ExecutorError> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_string()];
    while let Some(dir) = stack.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                stack.push(path.to_string_lossy().into_owned());
            } else {
                out.push(path.to_string_lossy().into_owned());
            }
        }
    }
    Ok(out)
}

/// Pull each configured artifact path back into the shared artifact
/// directory: into `artifact_dir/<node_name>/<path>` when a node name is
/// present, else directly into `artifact_dir/<path>`.
pub async fn pull_artifacts(
    driver: &dyn NodeDriver,
    remote_artifacts_dir: &str,
    artifacts: &[String],
    artifact_dir: &str,
    node_name: Option<&str>,
    cancel: &CancellationToken,
) -> Result<(), ExecutorError> {
    for path in artifacts {
        let remote_path = driver.join(&[remote_artifacts_dir, path]);
        let local_path = match node_name {
            Some(node) => format!("{artifact_dir}/{node}/{path}"),
            None => format!("{artifact_dir}/{path}"),
        };
        driver.download(&remote_path, &local_path, cancel).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
