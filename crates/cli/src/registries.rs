// SPDX-License-Identifier: MIT

//! Process-start wiring for the executor and transport registries: the two
//! reference executors and the SSH transport, built once and handed to the
//! Flow Runner.

use flowctl_executor::{DockerExecutorFactory, ExecutorRegistry, ScriptExecutorFactory};
use flowctl_transport::{SshHostKeyPolicy, SshTransport, TransportRegistry};
use std::sync::Arc;

pub fn build_executor_registry() -> ExecutorRegistry {
    let registry = ExecutorRegistry::new();
    registry.register("docker", Arc::new(DockerExecutorFactory));
    registry.register("script", Arc::new(ScriptExecutorFactory));
    registry
}

/// Registers the SSH-family transport under `"ssh"`, with the reference
/// insecure-accept-any host-key policy — hardening this is left to the
/// embedder.
pub fn build_transport_registry() -> TransportRegistry {
    let registry = TransportRegistry::new();
    registry.register("ssh", Arc::new(SshTransport::new(SshHostKeyPolicy::InsecureAcceptAny)));
    registry
}
