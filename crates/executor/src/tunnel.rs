// SPDX-License-Identifier: MIT

//! Docker-over-SSH tunnel.
//!
//! When the driver reaches a remote host, the Docker API client still talks
//! plain TCP to a loopback address; this module proxies every connection it
//! receives to `driver.dial("unix", "/var/run/docker.sock")`.
//!
//! A single-connection tunnel would leave later connections sharing a stale
//! proxy once the first one closes, so each accepted connection here gets
//! its own proxy task — a Docker client that opens more than one connection
//! (as `bollard`'s connection-pooled hyper client does) is handled
//! correctly.

use flowctl_driver::NodeDriver;
use std::sync::Arc;
use tokio::io::{copy_bidirectional, AsyncRead, AsyncWrite};
use tokio::net::TcpListener;

/// Bind a loopback listener and spawn a background task that accepts
/// connections for as long as `driver` is alive, proxying each one to the
/// remote Docker socket. Returns the bound local address.
pub async fn spawn(driver: Arc<dyn NodeDriver>) -> std::io::Result<std::net::SocketAddr> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let local_addr = listener.local_addr()?;

    tokio::spawn(async move {
        loop {
            let (conn, _peer) = match listener.accept().await {
                Ok(pair) => pair,
                Err(error) => {
                    tracing::warn!(%error, "docker tunnel listener stopped accepting");
                    break;
                }
            };
            let driver = driver.clone();
            tokio::spawn(async move {
                match driver.dial("unix", "/var/run/docker.sock").await {
                    Ok(remote) => proxy(conn, remote).await,
                    Err(error) => tracing::warn!(%error, "failed to dial remote docker socket"),
                }
            });
        }
    });

    Ok(local_addr)
}

async fn proxy(mut local: impl AsyncRead + AsyncWrite + Unpin, mut remote: impl AsyncRead + AsyncWrite + Unpin) {
    if let Err(error) = copy_bidirectional(&mut local, &mut remote).await {
        tracing::debug!(%error, "docker tunnel connection closed");
    }
}

#[cfg(test)]
#[path = "tunnel_tests.rs"]
mod tests;
