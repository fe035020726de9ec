// SPDX-License-Identifier: MIT

//! Docker executor: runs the action's script inside a
//! container, optionally tunnelled to a remote Docker daemon over SSH.

use crate::error::ExecutorError;
use crate::executor::{ExecutionContext, Executor};
use crate::output;
use crate::registry::ExecutorFactory;
use crate::tunnel;
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogsOptions, RemoveContainerOptions, StopContainerOptions,
    WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::secret::HostConfig;
use bollard::Docker;
use flowctl_core::ResultMap;
use flowctl_driver::NodeDriver;
use futures::StreamExt;
use schemars::{JsonSchema, Schema};
use serde::Deserialize;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Grace period for `ContainerStop` when an execution is cancelled.
const STOP_GRACE_SECONDS: i64 = 10;

fn default_false() -> bool {
    false
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DockerConfig {
    pub image: String,
    pub script: String,
    /// Custom entrypoint; when set the script is passed as the sole
    /// argument instead of being wrapped in `/bin/sh -c`.
    #[serde(default)]
    pub entrypoint: Option<Vec<String>>,
    /// Suppress container removal for debugging.
    #[serde(default = "default_false")]
    pub keep_container: bool,
}

pub struct DockerExecutor {
    name: String,
    driver: Arc<dyn NodeDriver>,
}

impl DockerExecutor {
    async fn client(&self) -> Result<Docker, ExecutorError> {
        if self.driver.is_remote() {
            let addr = tunnel::spawn(self.driver.clone())
                .await
                .map_err(|e| ExecutorError::Driver(flowctl_driver::DriverError::io("dial", "docker.sock", e)))?;
            Ok(Docker::connect_with_http(&format!("tcp://{addr}"), 120, bollard::API_DEFAULT_VERSION)?)
        } else {
            Ok(Docker::connect_with_local_defaults()?)
        }
    }
}

#[async_trait]
impl Executor for DockerExecutor {
    async fn execute(&self, ctx: ExecutionContext<'_>) -> Result<ResultMap, ExecutorError> {
        let config: DockerConfig = serde_yaml_ng::from_value(ctx.with_config.clone())
            .map_err(|source| ExecutorError::InvalidConfig { executor: "docker", source })?;

        let cancel = ctx.cancel;
        let work_dir = self.driver.working_directory().to_string();
        let output_path = self.driver.join(&[&work_dir, "output"]);
        let artifacts_dir = self.driver.join(&[&work_dir, "artifacts"]);
        self.driver.create_file(&output_path).await?;
        self.driver.create_dir(&artifacts_dir).await?;
        output::push_artifacts(self.driver.as_ref(), ctx.artifact_dir, &artifacts_dir, cancel).await?;

        let docker = self.client().await?;
        pull_image(&docker, &config.image).await?;

        let env = output::build_env(ctx.inputs);
        let env: Vec<String> = env.into_iter().map(|(k, v)| format!("{k}={v}")).collect();
        let cmd = match &config.entrypoint {
            Some(entrypoint) => {
                let mut full = entrypoint.clone();
                full.push(config.script.clone());
                full
            }
            None => vec!["/bin/sh".to_string(), "-c".to_string(), config.script.clone()],
        };

        let container_name = format!("flowctl-{}", nanoid::nanoid!(12));
        let host_config = HostConfig {
            binds: Some(vec![
                format!("{output_path}:{}", output::CONTAINER_OUTPUT_PATH),
                format!("{artifacts_dir}:{}", output::CONTAINER_ARTIFACTS_PATH),
            ]),
            ..Default::default()
        };
        let container_config = Config {
            image: Some(config.image.clone()),
            cmd: Some(cmd),
            env: Some(env),
            host_config: Some(host_config),
            ..Default::default()
        };

        let container = docker
            .create_container(Some(CreateContainerOptions { name: container_name.clone(), platform: None }), container_config)
            .await?;
        docker.start_container::<String>(&container.id, None).await?;

        stream_logs(&docker, &container.id, ctx.stdout, ctx.stderr).await?;

        let exit_code = wait_for_exit(&docker, &container.id, cancel).await?;

        if !config.keep_container {
            docker
                .remove_container(&container.id, Some(RemoveContainerOptions { force: true, ..Default::default() }))
                .await
                .ok();
        }

        if exit_code != 0 {
            return Err(ExecutorError::NonZeroExit(exit_code));
        }

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

        tracing::info!(executor = %self.name, container = %container.id, "docker action completed");
        Ok(result)
    }
}

async fn pull_image(docker: &Docker, image: &str) -> Result<(), ExecutorError> {
    let options = CreateImageOptions { from_image: image, ..Default::default() };
    let mut stream = docker.create_image(Some(options), None, None);
    while let Some(progress) = stream.next().await {
        let progress = progress?;
        if let Some(status) = progress.status {
            tracing::debug!(image, status, "docker pull progress");
        }
    }
    Ok(())
}

async fn stream_logs(
    docker: &Docker,
    container_id: &str,
    stdout: &mut (dyn Write + Send),
    stderr: &mut (dyn Write + Send),
) -> Result<(), ExecutorError> {
    let options = LogsOptions::<String> {
        follow: true,
        stdout: true,
        stderr: true,
        ..Default::default()
    };
    let mut stream = docker.logs(container_id, Some(options));
    while let Some(chunk) = stream.next().await {
        match chunk? {
            bollard::container::LogOutput::StdOut { message } => stdout.write_all(&message)?,
            bollard::container::LogOutput::StdErr { message } => stderr.write_all(&message)?,
            _ => {}
        }
    }
    Ok(())
}

/// Wait for the container to exit, stopping it with a 10s grace period if
/// `cancel` fires first.
async fn wait_for_exit(docker: &Docker, container_id: &str, cancel: &CancellationToken) -> Result<i64, ExecutorError> {
    let mut wait_stream = docker.wait_container(container_id, None::<WaitContainerOptions<String>>);
    tokio::select! {
        _ = cancel.cancelled() => {
            docker
                .stop_container(container_id, Some(StopContainerOptions { t: STOP_GRACE_SECONDS as i64 }))
                .await
                .ok();
            Ok(-1)
        }
        result = wait_stream.next() => {
            match result {
                Some(Ok(response)) => Ok(response.status_code),
                Some(Err(e)) => Err(e.into()),
                None => Ok(0),
            }
        }
    }
}

pub struct DockerExecutorFactory;

impl ExecutorFactory for DockerExecutorFactory {
    fn create(&self, name: &str, driver: Arc<dyn NodeDriver>) -> Arc<dyn Executor> {
        Arc::new(DockerExecutor { name: name.to_string(), driver })
    }

    fn schema(&self) -> Schema {
        schemars::schema_for!(DockerConfig)
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
