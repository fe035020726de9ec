// SPDX-License-Identifier: MIT

//! SSH-backed remote [`NodeDriver`]. File ops are composed
//! over a [`RemoteClient`]; `Exec` composes `export K=V && cd workdir && cmd`
//! as a single shell invocation so env and cwd apply uniformly across
//! transports.

use crate::driver::{scratch_dir_name, NodeDriver};
use crate::error::DriverError;
use async_trait::async_trait;
use flowctl_core::{Node, OsFamily};
use flowctl_transport::{NodeConfig, RemoteClient, TransportRegistry};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct RemoteDriver {
    client: Box<dyn RemoteClient>,
    working_dir: String,
}

impl RemoteDriver {
    pub async fn new(node: &Node, registry: &TransportRegistry) -> Result<Self, DriverError> {
        if node.os_family == OsFamily::Windows {
            return Err(DriverError::UnsupportedOs { os: node.os_family });
        }
        let config = NodeConfig::from_node(node);
        let client = registry.connect(&node.connection_type, &config).await?;
        let working_dir = format!("/tmp/{}", scratch_dir_name());
        client
            .run_command(&format!("mkdir -p '{working_dir}'"), &mut std::io::sink(), &mut std::io::sink())
            .await?;
        tracing::info!(node = %node.name, working_dir, "remote driver scratch directory created");
        Ok(Self { client, working_dir })
    }
}

fn quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', "'\\''"))
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;

#[async_trait]
impl NodeDriver for RemoteDriver {
    async fn upload(&self, local: &str, remote: &str, _cancel: &CancellationToken) -> Result<(), DriverError> {
        let data = tokio::fs::read(local).await.map_err(|e| DriverError::io("upload", local, e))?;
        self.client.upload(remote, &data).await?;
        Ok(())
    }

    async fn download(&self, remote: &str, local: &str, _cancel: &CancellationToken) -> Result<(), DriverError> {
        let data = self.client.download(remote).await?;
        if let Some(parent) = std::path::Path::new(local).parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DriverError::io("create_dir", parent.display().to_string(), e))?;
        }
        tokio::fs::write(local, data).await.map_err(|e| DriverError::io("download", local, e))?;
        Ok(())
    }

    async fn create_dir(&self, path: &str) -> Result<(), DriverError> {
        let cmd = format!("mkdir -p {} && chmod 0755 {}", quote(path), quote(path));
        self.run(&cmd).await
    }

    async fn create_file(&self, path: &str) -> Result<(), DriverError> {
        let q = quote(path);
        self.run(&format!("[ -e {q} ] || : > {q}")).await
    }

    async fn remove(&self, path: &str) -> Result<(), DriverError> {
        self.run(&format!("rm -rf {}", quote(path))).await
    }

    async fn set_permissions(&self, path: &str, mode: u32) -> Result<(), DriverError> {
        self.run(&format!("chmod {:o} {}", mode, quote(path))).await
    }

    async fn exec(
        &self,
        cmd: &str,
        working_dir: &str,
        env: &HashMap<String, String>,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
        _cancel: &CancellationToken,
    ) -> Result<(), DriverError> {
        let exports: String = env
            .iter()
            .map(|(k, v)| format!("export {}={} && ", k, quote(v)))
            .collect();
        let full = format!("{exports}cd {} && {cmd}", quote(working_dir));
        let status = self.client.run_command(&full, stdout, stderr).await?;
        if status != 0 {
            return Err(DriverError::NonZeroExit(status as i32));
        }
        Ok(())
    }

    async fn dial(&self, network: &str, address: &str) -> Result<flowctl_transport::DialStream, DriverError> {
        Ok(self.client.dial(network, address).await?)
    }

    fn temp_dir(&self) -> &str {
        "/tmp"
    }

    async fn list_files(&self, dir: &str) -> Result<Vec<String>, DriverError> {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let cmd = format!("find {} -maxdepth 1 -type f -printf '%f\\n'", quote(dir));
        self.client.run_command(&cmd, &mut out, &mut err).await?;
        let text = String::from_utf8_lossy(&out);
        Ok(text.lines().map(str::to_string).collect())
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn working_directory(&self) -> &str {
        &self.working_dir
    }

    async fn close(&self) -> Result<(), DriverError> {
        Ok(self.client.close().await?)
    }
}

impl RemoteDriver {
    async fn run(&self, cmd: &str) -> Result<(), DriverError> {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let status = self.client.run_command(cmd, &mut out, &mut err).await?;
        if status != 0 {
            return Err(DriverError::NonZeroExit(status as i32));
        }
        Ok(())
    }
}

/// Construct the correct driver kind for `node`, or the local driver when
/// `node` carries no hostname (the implicit local node).
pub async fn new_node_driver(
    node: Option<&Node>,
    registry: &TransportRegistry,
) -> Result<Arc<dyn NodeDriver>, DriverError> {
    match node {
        None => Ok(Arc::new(crate::local::LocalDriver::new().await?)),
        Some(n) if n.hostname.is_empty() => Ok(Arc::new(crate::local::LocalDriver::new().await?)),
        Some(n) => Ok(Arc::new(RemoteDriver::new(n, registry).await?)),
    }
}
