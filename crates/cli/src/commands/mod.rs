// SPDX-License-Identifier: MIT

//! `flowctl` subcommands.

pub mod approve;
pub mod cancel;
pub mod schema;
pub mod status;
pub mod trigger;
pub mod worker;
