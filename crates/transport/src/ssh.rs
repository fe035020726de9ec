// SPDX-License-Identifier: MIT

//! SSH-family transport. Registered under the `"ssh"`
//! connection-type key.
//!
//! Host-key verification: this transport accepts any host key
//! (`SshHostKeyPolicy::InsecureAcceptAny`) and requires hardening before
//! production use. A fingerprint-pinning or `known_hosts`-backed policy is
//! left to the
//! embedder by swapping the [`russh::client::Handler`] implementation.

use crate::client::{DialStream, NodeConfig, RemoteClient, RemoteClientFactory};
use crate::error::TransportError;
use async_trait::async_trait;
use flowctl_core::NodeAuth;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Host-key verification policy for [`SshTransport`].
#[derive(Clone, Copy, Debug, Default)]
pub enum SshHostKeyPolicy {
    /// Accept any presented host key. Development-only; see module docs.
    #[default]
    InsecureAcceptAny,
}

struct InsecureHandler;

#[async_trait]
impl client::Handler for InsecureHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // InsecureAcceptAny: see module docs.
        Ok(true)
    }
}

/// Factory registered under the `"ssh"` transport key.
#[derive(Clone, Default)]
pub struct SshTransport {
    host_key_policy: SshHostKeyPolicy,
}

impl SshTransport {
    pub fn new(host_key_policy: SshHostKeyPolicy) -> Self {
        Self { host_key_policy }
    }
}

#[async_trait]
impl RemoteClientFactory for SshTransport {
    async fn connect(&self, config: &NodeConfig) -> Result<Box<dyn RemoteClient>, TransportError> {
        let SshHostKeyPolicy::InsecureAcceptAny = self.host_key_policy;
        let ssh_config = Arc::new(client::Config::default());
        let mut handle: Handle<InsecureHandler> =
            client::connect(ssh_config, (config.host.as_str(), config.port), InsecureHandler)
                .await
                .map_err(|e| TransportError::Handshake(e.to_string()))?;

        let authenticated = match &config.auth {
            NodeAuth::Password { key } => handle
                .authenticate_password(&config.user, key)
                .await
                .map_err(|e| TransportError::Handshake(e.to_string()))?
                .success(),
            NodeAuth::PrivateKey { key } => {
                let key_pair = russh_keys::decode_secret_key(key, None)
                    .map_err(|e| TransportError::Handshake(format!("bad private key: {e}")))?;
                handle
                    .authenticate_publickey(&config.user, Arc::new(key_pair))
                    .await
                    .map_err(|e| TransportError::Handshake(e.to_string()))?
                    .success()
            }
        };
        if !authenticated {
            return Err(TransportError::AuthRejected { user: config.user.clone() });
        }

        Ok(Box::new(SshClient { handle: Mutex::new(handle) }))
    }
}

/// One live SSH connection. `Exec` composes `export K=V && cd workdir && cmd`
/// as a single shell invocation so env and cwd apply uniformly; that
/// composition happens one layer up, in `flowctl_driver`. Here we only run
/// whatever command string we are given.
pub struct SshClient {
    handle: Mutex<Handle<InsecureHandler>>,
}

impl SshClient {
    async fn exec_channel(&self, cmd: &str) -> Result<russh::Channel<client::Msg>, TransportError> {
        let handle = self.handle.lock().await;
        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| TransportError::Channel(e.to_string()))?;
        channel
            .exec(true, cmd)
            .await
            .map_err(|e| TransportError::Channel(e.to_string()))?;
        Ok(channel)
    }
}

#[async_trait]
impl RemoteClient for SshClient {
    async fn run_command(
        &self,
        cmd: &str,
        stdout: &mut (dyn Write + Send),
        stderr: &mut (dyn Write + Send),
    ) -> Result<u32, TransportError> {
        let mut channel = self.exec_channel(cmd).await?;
        let mut code = 0u32;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => {
                    stdout.write_all(&data).map_err(TransportError::Io)?;
                }
                ChannelMsg::ExtendedData { data, .. } => {
                    stderr.write_all(&data).map_err(TransportError::Io)?;
                }
                ChannelMsg::ExitStatus { exit_status } => code = exit_status,
                ChannelMsg::Eof | ChannelMsg::Close => break,
                _ => {}
            }
        }
        Ok(code)
    }

    async fn upload(&self, remote_path: &str, data: &[u8]) -> Result<(), TransportError> {
        let parent_mkdir = match remote_path.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => format!("mkdir -p '{dir}' && "),
            _ => String::new(),
        };
        let cmd = format!("{parent_mkdir}cat > '{remote_path}'");
        let mut channel = self.exec_channel(&cmd).await?;
        channel
            .data(data)
            .await
            .map_err(|e| TransportError::Channel(e.to_string()))?;
        channel.eof().await.map_err(|e| TransportError::Channel(e.to_string()))?;
        while let Some(msg) = channel.wait().await {
            if let ChannelMsg::ExitStatus { exit_status } = msg {
                if exit_status != 0 {
                    return Err(TransportError::NonZeroExit(exit_status));
                }
            }
        }
        Ok(())
    }

    async fn download(&self, remote_path: &str) -> Result<Vec<u8>, TransportError> {
        let mut channel = self.exec_channel(&format!("cat '{remote_path}'")).await?;
        let mut buf = Vec::new();
        let mut code = 0u32;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => buf.extend_from_slice(&data),
                ChannelMsg::ExitStatus { exit_status } => code = exit_status,
                _ => {}
            }
        }
        if code != 0 {
            return Err(TransportError::NonZeroExit(code));
        }
        Ok(buf)
    }

    async fn dial(&self, network: &str, address: &str) -> Result<DialStream, TransportError> {
        let handle = self.handle.lock().await;
        let channel = match network {
            "unix" => handle
                .channel_open_direct_streamlocal(address, "flowctl", 0)
                .await
                .map_err(|e| TransportError::Dial {
                    network: "unix",
                    address: address.to_string(),
                    source: Box::new(e),
                })?,
            "tcp" => {
                let (host, port) = parse_tcp_address(address).map_err(|source| TransportError::Dial {
                    network: "tcp",
                    address: address.to_string(),
                    source: Box::new(std::io::Error::other(source)),
                })?;
                handle
                    .channel_open_direct_tcpip(host, port, "flowctl", 0)
                    .await
                    .map_err(|e| TransportError::Dial {
                        network: "tcp",
                        address: address.to_string(),
                        source: Box::new(e),
                    })?
            }
            other => {
                return Err(TransportError::Dial {
                    network: "unsupported",
                    address: format!("{other}:{address}"),
                    source: Box::new(std::io::Error::other("unsupported dial network")),
                })
            }
        };
        Ok(Box::new(channel.into_stream()))
    }

    async fn close(&self) -> Result<(), TransportError> {
        let handle = self.handle.lock().await;
        handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(|e| TransportError::Channel(e.to_string()))
    }
}

/// Split a `host:port` dial address, rejecting anything without a trailing
/// numeric port. Split on the last `:` so literal IPv6 addresses (which
/// contain `:` themselves) still separate correctly from their port.
fn parse_tcp_address(address: &str) -> Result<(&str, u32), &'static str> {
    let (host, port) = address.rsplit_once(':').ok_or("address must be host:port")?;
    let port: u32 = port.parse().map_err(|_| "invalid port")?;
    Ok((host, port))
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
