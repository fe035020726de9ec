// SPDX-License-Identifier: MIT

//! The [`NodeDriver`] abstraction: the single interface for
//! host-local and remote file/exec operations used by executors.

use crate::error::DriverError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// One file or exec operation against either the local host or a remote
/// node. Every operation accepts a [`CancellationToken`] and returns
/// promptly once it fires.
#[async_trait]
pub trait NodeDriver: Send + Sync {
    /// Byte-exact copy of `local` to `remote`, creating intermediate
    /// directories and overwriting the destination.
    async fn upload(&self, local: &str, remote: &str, cancel: &CancellationToken) -> Result<(), DriverError>;

    /// Byte-exact copy of `remote` to `local`.
    async fn download(&self, remote: &str, local: &str, cancel: &CancellationToken) -> Result<(), DriverError>;

    /// Recursive mkdir, mode 0755.
    async fn create_dir(&self, path: &str) -> Result<(), DriverError>;

    /// Create an empty file; an existing file is left untouched.
    async fn create_file(&self, path: &str) -> Result<(), DriverError>;

    /// Recursive delete, idempotent (missing path is not an error).
    async fn remove(&self, path: &str) -> Result<(), DriverError>;

    /// chmod semantics.
    async fn set_permissions(&self, path: &str, mode: u32) -> Result<(), DriverError>;

    /// Run `/bin/sh -c cmd`, streaming stdout/stderr. A non-zero exit is an
    /// error; cancellation kills the process.
    async fn exec(
        &self,
        cmd: &str,
        working_dir: &str,
        env: &HashMap<String, String>,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
        cancel: &CancellationToken,
    ) -> Result<(), DriverError>;

    /// Open a transport-layer connection routed through this driver's host
    /// (used to tunnel Docker API traffic over SSH).
    async fn dial(&self, network: &str, address: &str) -> Result<flowctl_transport::DialStream, DriverError>;

    /// Driver-specific scratch root (`/tmp` for Linux targets).
    fn temp_dir(&self) -> &str;

    /// Join path components using this driver's separator convention
    /// (forward-slash for Linux targets).
    fn join(&self, parts: &[&str]) -> String {
        parts.join("/")
    }

    /// Immediate children of `dir`, files only.
    async fn list_files(&self, dir: &str) -> Result<Vec<String>, DriverError>;

    /// Whether this driver reaches a remote host (vs. the local machine).
    /// Executors that must choose between a local API and a tunnelled one
    /// (the Docker executor) branch on this.
    fn is_remote(&self) -> bool;

    /// The per-construction scratch working directory (`flows-<rand>` under
    /// [`NodeDriver::temp_dir`]).
    fn working_directory(&self) -> &str;

    /// Release the underlying transport.
    async fn close(&self) -> Result<(), DriverError>;
}

/// `flows-<rand>` scratch directory name created at driver construction.
pub fn scratch_dir_name() -> String {
    format!("flows-{}", nanoid::nanoid!(10))
}
