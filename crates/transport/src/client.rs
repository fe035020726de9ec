// SPDX-License-Identifier: MIT

//! The `RemoteClient` contract: one live connection to a
//! [`Node`], used by the remote [`flowctl_driver`] to run commands and copy
//! files, and by the Docker executor to tunnel API traffic.

use crate::error::TransportError;
use async_trait::async_trait;
use flowctl_core::NodeAuth;
use std::io::Write;
use tokio::io::{AsyncRead, AsyncWrite};

/// Connection parameters handed to a transport factory. A thin, transport-
/// agnostic projection of [`flowctl_core::Node`] — factories only need the
/// dial target and credentials, not the full node record.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub auth: NodeAuth,
}

impl NodeConfig {
    pub fn from_node(node: &flowctl_core::Node) -> Self {
        Self {
            host: node.hostname.clone(),
            port: node.port,
            user: node.username.clone(),
            auth: node.auth.clone(),
        }
    }
}

/// A boxed, type-erased duplex byte stream returned by [`RemoteClient::dial`].
pub type DialStream = Box<dyn DuplexByteStream>;

/// Marker trait combining the async read/write halves a tunnel needs.
pub trait DuplexByteStream: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> DuplexByteStream for T {}

/// One live remote-shell connection.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Run `cmd` via the remote shell, streaming stdout/stderr as they
    /// arrive. Returns the remote exit status; non-zero is not itself an
    /// error here (callers, e.g. the driver's `Exec`, decide policy).
    async fn run_command(
        &self,
        cmd: &str,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> Result<u32, TransportError>;

    /// Byte-exact upload of `data` to `remote_path`, creating intermediate
    /// directories.
    async fn upload(&self, remote_path: &str, data: &[u8]) -> Result<(), TransportError>;

    /// Byte-exact download of `remote_path`.
    async fn download(&self, remote_path: &str) -> Result<Vec<u8>, TransportError>;

    /// Open a tunnelled connection to `address` on `network` ("tcp" or
    /// "unix") as seen from the remote host, used to reach
    /// `/var/run/docker.sock` through the Docker-over-SSH tunnel.
    async fn dial(&self, network: &str, address: &str) -> Result<DialStream, TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

/// A factory constructing a [`RemoteClient`] for one connection-type key.
#[async_trait]
pub trait RemoteClientFactory: Send + Sync {
    async fn connect(&self, config: &NodeConfig) -> Result<Box<dyn RemoteClient>, TransportError>;
}
