// SPDX-License-Identifier: MIT

//! Transport registry: connection-type string → [`RemoteClientFactory`].
//!
//! Rather than a process-wide global populated by init-time side effects,
//! this is an explicit object constructed once at startup and threaded
//! through to the runner.

use crate::client::{NodeConfig, RemoteClient, RemoteClientFactory};
use crate::error::TransportError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of transport factories keyed by `connection_type`.
///
/// Registration happens once at process start; lookup of
/// an unregistered key fails with [`TransportError::UnknownTransport`].
#[derive(Clone, Default)]
pub struct TransportRegistry {
    factories: Arc<RwLock<HashMap<String, Arc<dyn RemoteClientFactory>>>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, connection_type: impl Into<String>, factory: Arc<dyn RemoteClientFactory>) {
        self.factories.write().insert(connection_type.into(), factory);
    }

    pub fn is_registered(&self, connection_type: &str) -> bool {
        self.factories.read().contains_key(connection_type)
    }

    pub async fn connect(
        &self,
        connection_type: &str,
        config: &NodeConfig,
    ) -> Result<Box<dyn RemoteClient>, TransportError> {
        let factory = self
            .factories
            .read()
            .get(connection_type)
            .cloned()
            .ok_or_else(|| TransportError::UnknownTransport(connection_type.to_string()))?;
        factory.connect(config).await
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
