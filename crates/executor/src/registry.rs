// SPDX-License-Identifier: MIT

//! Executor registry: executor-name → factory `(name, driver) → Executor`.
//! Each factory also publishes a JSON Schema describing its `with` block,
//! surfaced to UIs via [`ExecutorRegistry::schema`].

use crate::executor::Executor;
use crate::error::ExecutorError;
use flowctl_driver::NodeDriver;
use parking_lot::RwLock;
use schemars::Schema;
use std::collections::HashMap;
use std::sync::Arc;

pub trait ExecutorFactory: Send + Sync {
    /// Build an executor instance bound to a freshly-constructed driver for
    /// one target node (instantiate with a fresh driver).
    fn create(&self, name: &str, driver: Arc<dyn NodeDriver>) -> Arc<dyn Executor>;

    /// JSON Schema describing the accepted `with` block.
    fn schema(&self) -> Schema;
}

/// Explicit, dependency-injected registry object — no process-wide statics.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    factories: Arc<RwLock<HashMap<String, Arc<dyn ExecutorFactory>>>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, factory: Arc<dyn ExecutorFactory>) {
        self.factories.write().insert(name.into(), factory);
    }

    pub fn create(
        &self,
        name: &str,
        driver: Arc<dyn NodeDriver>,
    ) -> Result<Arc<dyn Executor>, ExecutorError> {
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ExecutorError::UnknownExecutor(name.to_string()))?;
        Ok(factory.create(name, driver))
    }

    pub fn schema(&self, name: &str) -> Result<Schema, ExecutorError> {
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ExecutorError::UnknownExecutor(name.to_string()))?;
        Ok(factory.schema())
    }

    pub fn names(&self) -> Vec<String> {
        self.factories.read().keys().cloned().collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
