// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flowctl-driver: the [`NodeDriver`] abstraction over host-local and
//! SSH-remote file/exec operations.

pub mod driver;
pub mod error;
pub mod local;
pub mod remote;

pub use driver::NodeDriver;
pub use error::DriverError;
pub use local::LocalDriver;
pub use remote::{new_node_driver, RemoteDriver};
