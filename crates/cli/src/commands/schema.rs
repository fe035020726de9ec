// SPDX-License-Identifier: MIT

//! `flowctl schema [executor]`: print the JSON Schema an
//! executor publishes for its `with` block, or list registered executor
//! names when called with none.

use crate::registries;
use anyhow::{Context, Result};

pub fn run(executor: Option<&str>) -> Result<()> {
    let registry = registries::build_executor_registry();
    let Some(name) = executor else {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    };

    let schema = registry.schema(name).with_context(|| format!("unknown executor '{name}'"))?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
