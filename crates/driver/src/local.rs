// SPDX-License-Identifier: MIT

//! Local-host [`NodeDriver`]: every operation maps directly
//! onto the host filesystem and `/bin/sh`.

use crate::driver::{scratch_dir_name, NodeDriver};
use crate::error::DriverError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

pub struct LocalDriver {
    working_dir: String,
}

impl LocalDriver {
    pub async fn new() -> Result<Self, DriverError> {
        let working_dir = format!("{}/{}", std::env::temp_dir().display(), scratch_dir_name());
        tokio::fs::create_dir_all(&working_dir)
            .await
            .map_err(|e| DriverError::io("create_dir", &working_dir, e))?;
        tracing::info!(working_dir, "local driver scratch directory created");
        Ok(Self { working_dir })
    }
}

#[async_trait]
impl NodeDriver for LocalDriver {
    async fn upload(&self, local: &str, remote: &str, _cancel: &CancellationToken) -> Result<(), DriverError> {
        if let Some(parent) = std::path::Path::new(remote).parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DriverError::io("create_dir", parent.display().to_string(), e))?;
        }
        tokio::fs::copy(local, remote)
            .await
            .map_err(|e| DriverError::io("upload", remote, e))?;
        Ok(())
    }

    async fn download(&self, remote: &str, local: &str, _cancel: &CancellationToken) -> Result<(), DriverError> {
        if let Some(parent) = std::path::Path::new(local).parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DriverError::io("create_dir", parent.display().to_string(), e))?;
        }
        tokio::fs::copy(remote, local)
            .await
            .map_err(|e| DriverError::io("download", remote, e))?;
        Ok(())
    }

    async fn create_dir(&self, path: &str) -> Result<(), DriverError> {
        tokio::fs::create_dir_all(path).await.map_err(|e| DriverError::io("create_dir", path, e))?;
        self.set_permissions(path, 0o755).await
    }

    async fn create_file(&self, path: &str) -> Result<(), DriverError> {
        match tokio::fs::metadata(path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tokio::fs::File::create(path).await.map_err(|e| DriverError::io("create_file", path, e))?;
                Ok(())
            }
            Err(e) => Err(DriverError::io("create_file", path, e)),
        }
    }

    async fn remove(&self, path: &str) -> Result<(), DriverError> {
        match tokio::fs::metadata(path).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DriverError::io("remove", path, e)),
            Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(path)
                .await
                .map_err(|e| DriverError::io("remove", path, e)),
            Ok(_) => tokio::fs::remove_file(path).await.map_err(|e| DriverError::io("remove", path, e)),
        }
    }

    async fn set_permissions(&self, path: &str, mode: u32) -> Result<(), DriverError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(mode);
            tokio::fs::set_permissions(path, perms)
                .await
                .map_err(|e| DriverError::io("set_permissions", path, e))
        }
        #[cfg(not(unix))]
        {
            let _ = mode;
            let _ = path;
            Ok(())
        }
    }

    async fn exec(
        &self,
        cmd: &str,
        working_dir: &str,
        env: &HashMap<String, String>,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
        cancel: &CancellationToken,
    ) -> Result<(), DriverError> {
        let mut child = Command::new("/bin/sh")
            .arg("-c")
            .arg(cmd)
            .current_dir(working_dir)
            .envs(env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DriverError::io("exec", cmd, e))?;

        let (Some(mut child_out), Some(mut child_err)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(DriverError::io("exec", cmd, std::io::Error::other("child spawned without piped stdio")));
        };

        let status = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(DriverError::Cancelled);
            }
            status = async {
                let mut out_buf = Vec::new();
                let mut err_buf = Vec::new();
                let (out_res, err_res, wait_res) = tokio::join!(
                    child_out.read_to_end(&mut out_buf),
                    child_err.read_to_end(&mut err_buf),
                    child.wait(),
                );
                out_res.map_err(|e| DriverError::io("exec", "stdout", e))?;
                err_res.map_err(|e| DriverError::io("exec", "stderr", e))?;
                stdout.write_all(&out_buf).map_err(|e| DriverError::io("exec", "stdout", e))?;
                stderr.write_all(&err_buf).map_err(|e| DriverError::io("exec", "stderr", e))?;
                wait_res.map_err(|e| DriverError::io("exec", cmd, e))
            } => status?,
        };

        if !status.success() {
            return Err(DriverError::NonZeroExit(status.code().unwrap_or(-1)));
        }
        Ok(())
    }

    async fn dial(&self, network: &str, address: &str) -> Result<flowctl_transport::DialStream, DriverError> {
        match network {
            "unix" => {
                #[cfg(unix)]
                {
                    let stream = tokio::net::UnixStream::connect(address)
                        .await
                        .map_err(|e| DriverError::io("dial", address, e))?;
                    Ok(Box::new(stream))
                }
                #[cfg(not(unix))]
                {
                    Err(DriverError::io(
                        "dial",
                        address,
                        std::io::Error::other("unix sockets unsupported on this platform"),
                    ))
                }
            }
            "tcp" => {
                let stream = tokio::net::TcpStream::connect(address)
                    .await
                    .map_err(|e| DriverError::io("dial", address, e))?;
                Ok(Box::new(stream))
            }
            other => Err(DriverError::io(
                "dial",
                address,
                std::io::Error::other(format!("unsupported network: {other}")),
            )),
        }
    }

    fn temp_dir(&self) -> &str {
        "/tmp"
    }

    async fn list_files(&self, dir: &str) -> Result<Vec<String>, DriverError> {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| DriverError::io("list_files", dir, e))?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| DriverError::io("list_files", dir, e))? {
            if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(files)
    }

    fn is_remote(&self) -> bool {
        false
    }

    fn working_directory(&self) -> &str {
        &self.working_dir
    }

    async fn close(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
