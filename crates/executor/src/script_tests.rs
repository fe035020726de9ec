// SPDX-License-Identifier: MIT

use super::*;
use flowctl_driver::LocalDriver;
use std::collections::HashMap;

#[tokio::test]
async fn script_executor_writes_output_file() {
    let driver: Arc<dyn NodeDriver> = Arc::new(LocalDriver::new().await.unwrap());
    let factory = ScriptExecutorFactory;
    let executor = factory.create("script", driver);

    let with_config: serde_yaml_ng::Value = serde_yaml_ng::from_str(
        "script: |\n  echo \"MESSAGE=hellothere\" > $FC_OUTPUT\n",
    )
    .unwrap();
    let inputs = HashMap::new();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let artifacts = Vec::new();
    let artifact_dir = std::env::temp_dir().join("flowctl-test-artifacts");
    tokio::fs::create_dir_all(&artifact_dir).await.unwrap();

    let ctx = ExecutionContext {
        with_config: &with_config,
        inputs: &inputs,
        artifacts: &artifacts,
        artifact_dir: artifact_dir.to_str().unwrap(),
        node_name: None,
        stdout: &mut stdout,
        stderr: &mut stderr,
        cancel: &tokio_util::sync::CancellationToken::new(),
    };

    let result = executor.execute(ctx).await.unwrap();
    assert_eq!(result.get("MESSAGE"), Some(&"hellothere".to_string()));
}

#[tokio::test]
async fn script_executor_prefixes_result_keys_with_node_name() {
    let driver: Arc<dyn NodeDriver> = Arc::new(LocalDriver::new().await.unwrap());
    let factory = ScriptExecutorFactory;
    let executor = factory.create("script", driver);

    let with_config: serde_yaml_ng::Value =
        serde_yaml_ng::from_str("script: |\n  echo \"K=v\" > $FC_OUTPUT\n").unwrap();
    let inputs = HashMap::new();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let artifacts = Vec::new();
    let artifact_dir = std::env::temp_dir().join("flowctl-test-artifacts-2");
    tokio::fs::create_dir_all(&artifact_dir).await.unwrap();

    let ctx = ExecutionContext {
        with_config: &with_config,
        inputs: &inputs,
        artifacts: &artifacts,
        artifact_dir: artifact_dir.to_str().unwrap(),
        node_name: Some("a"),
        stdout: &mut stdout,
        stderr: &mut stderr,
        cancel: &tokio_util::sync::CancellationToken::new(),
    };

    let result = executor.execute(ctx).await.unwrap();
    assert_eq!(result.get("a.K"), Some(&"v".to_string()));
}

#[tokio::test]
async fn script_executor_propagates_nonzero_exit() {
    let driver: Arc<dyn NodeDriver> = Arc::new(LocalDriver::new().await.unwrap());
    let factory = ScriptExecutorFactory;
    let executor = factory.create("script", driver);

    let with_config: serde_yaml_ng::Value = serde_yaml_ng::from_str("script: 'exit 7'\n").unwrap();
    let inputs = HashMap::new();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let artifacts = Vec::new();
    let artifact_dir = std::env::temp_dir().join("flowctl-test-artifacts-3");
    tokio::fs::create_dir_all(&artifact_dir).await.unwrap();

    let ctx = ExecutionContext {
        with_config: &with_config,
        inputs: &inputs,
        artifacts: &artifacts,
        artifact_dir: artifact_dir.to_str().unwrap(),
        node_name: None,
        stdout: &mut stdout,
        stderr: &mut stderr,
        cancel: &tokio_util::sync::CancellationToken::new(),
    };

    let err = executor.execute(ctx).await.unwrap_err();
    assert!(matches!(err, ExecutorError::NonZeroExit(7)));
}
