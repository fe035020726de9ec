// SPDX-License-Identifier: MIT

//! Script executor: writes the script to a temp file with the
//! configured extension, uploads it via the driver, `chmod 0755`, runs
//! `<interpreter> <path>`, then removes the remote script.

use crate::error::ExecutorError;
use crate::executor::{ExecutionContext, Executor};
use crate::output;
use crate::registry::ExecutorFactory;
use async_trait::async_trait;
use flowctl_core::ResultMap;
use flowctl_driver::NodeDriver;
use schemars::{JsonSchema, Schema};
use serde::Deserialize;
use std::sync::Arc;

fn default_interpreter() -> String {
    "/bin/bash".to_string()
}

fn default_extension() -> String {
    ".sh".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScriptConfig {
    pub script: String,
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_extension")]
    pub extension: String,
}

pub struct ScriptExecutor {
    name: String,
    driver: Arc<dyn NodeDriver>,
}

#[async_trait]
impl Executor for ScriptExecutor {
    async fn execute(&self, ctx: ExecutionContext<'_>) -> Result<ResultMap, ExecutorError> {
        let config: ScriptConfig = serde_yaml_ng::from_value(ctx.with_config.clone())
            .map_err(|source| ExecutorError::InvalidConfig { executor: "script", source })?;

        let cancel = ctx.cancel;
        let work_dir = self.driver.working_directory().to_string();
        let script_path = self.driver.join(&[&work_dir, &format!("script{}", config.extension)]);
        let output_path = self.driver.join(&[&work_dir, "output"]);
        let artifacts_dir = self.driver.join(&[&work_dir, "artifacts"]);

        self.driver.create_file(&output_path).await?;
        self.driver.create_dir(&artifacts_dir).await?;
        output::push_artifacts(self.driver.as_ref(), ctx.artifact_dir, &artifacts_dir, cancel).await?;

        let local_script = tempfile::NamedTempFile::new()?;
        tokio::fs::write(local_script.path(), &config.script).await?;
        self.driver.upload(&local_script.path().to_string_lossy(), &script_path, cancel).await?;
        self.driver.set_permissions(&script_path, 0o755).await?;

        let env = output::build_env(ctx.inputs);
        let cmd = format!("{} {}", config.interpreter, script_path);
        let exec_result = self
            .driver
            .exec(&cmd, &work_dir, &env, ctx.stdout, ctx.stderr, cancel)
            .await;

        self.driver.remove(&script_path).await.ok();

        if let Err(flowctl_driver::DriverError::NonZeroExit(code)) = exec_result {
            return Err(ExecutorError::NonZeroExit(code as i64));
        }
        exec_result?;

        let local_output = tempfile::NamedTempFile::new()?;
        self.driver
            .download(&output_path, &local_output.path().to_string_lossy(), cancel)
            .await?;
        let bytes = tokio::fs::read(local_output.path()).await?;
        let mut result = output::parse_output(&bytes);

        output::pull_artifacts(
            self.driver.as_ref(),
            &artifacts_dir,
            ctx.artifacts,
            ctx.artifact_dir,
            ctx.node_name,
            cancel,
        )
        .await?;

        if let Some(node) = ctx.node_name {
            result = result.into_iter().map(|(k, v)| (format!("{node}.{k}"), v)).collect();
        }

        tracing::info!(executor = %self.name, "script action completed");
        Ok(result)
    }
}

pub struct ScriptExecutorFactory;

impl ExecutorFactory for ScriptExecutorFactory {
    fn create(&self, name: &str, driver: Arc<dyn NodeDriver>) -> Arc<dyn Executor> {
        Arc::new(ScriptExecutor { name: name.to_string(), driver })
    }

    fn schema(&self) -> Schema {
        schemars::schema_for!(ScriptConfig)
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
