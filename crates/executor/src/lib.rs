// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flowctl-executor: turns an action's typed config + inputs into a child
//! process or container and collects its outputs.

pub mod docker;
pub mod error;
pub mod executor;
pub mod output;
pub mod registry;
pub mod script;
pub mod tunnel;

pub use docker::{DockerConfig, DockerExecutor, DockerExecutorFactory};
pub use error::ExecutorError;
pub use executor::{ExecutionContext, Executor};
pub use registry::{ExecutorFactory, ExecutorRegistry};
pub use script::{ScriptConfig, ScriptExecutor, ScriptExecutorFactory};
