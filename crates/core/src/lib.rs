// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! flowctl-core: shared data model, id generation, and error types for the
//! flowctl workflow execution engine.

pub mod macros;

pub mod clock;
pub mod dotenv;
pub mod error;
pub mod event;
pub mod execution;
pub mod flow;
pub mod id;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::FlowError;
pub use event::{ApprovalId, ResultMap, StreamMessage};
pub use execution::{ExecId, ExecutionStatus, FlowExecutionPayload, TriggerType};
pub use flow::{
    Action, Flow, InputDef, InputType, Node, NodeAuth, OsFamily, OutputDef, Variable,
};
pub use id::short;
