// SPDX-License-Identifier: MIT

//! Flow, Action, and Node data model.

use crate::error::FlowError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single-key `{name: value}` mapping, possibly containing `{{ expr }}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

/// Declared type of a flow input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    String,
    Int,
    Float,
    Bool,
    SliceString,
    SliceInt,
    SliceUint,
    SliceFloat,
}

/// A declared flow input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InputType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Expression evaluated against the supplied value; a falsy result
    /// rejects the input at trigger time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
}

/// Node auth method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum NodeAuth {
    PrivateKey { key: String },
    Password { key: String },
}

impl NodeAuth {
    pub fn method(&self) -> &'static str {
        match self {
            NodeAuth::PrivateKey { .. } => "private_key",
            NodeAuth::Password { .. } => "password",
        }
    }
}

/// Remote target: a host reached through a registered transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub hostname: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub username: String,
    pub os_family: OsFamily,
    /// Transport registry key, e.g. "ssh", "ssh-mux".
    pub connection_type: String,
    pub auth: NodeAuth,
}

fn default_ssh_port() -> u16 {
    22
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Linux,
    Windows,
    Darwin,
}

/// An action within a flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique within the flow.
    pub id: String,
    pub name: String,
    /// Executor registry key, e.g. "docker", "script".
    pub executor: String,
    /// Opaque config handed to the executor, passed through as YAML.
    pub with: serde_yaml_ng::Value,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub approval: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub artifacts: Vec<String>,
    /// Target nodes; empty means run once on an implicit local node.
    #[serde(default)]
    pub on: Vec<Node>,
}

impl Action {
    /// True when the action has no declared targets — it still runs, once,
    /// on an implicit local node.
    pub fn is_local_only(&self) -> bool {
        self.on.is_empty()
    }
}

/// Declared flow output (name aliasing a result key produced by an action).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDef {
    pub name: String,
    pub from: String,
}

/// An immutable snapshot executed by a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    pub namespace: String,
    #[serde(default)]
    pub inputs: Vec<InputDef>,
    pub actions: Vec<Action>,
    #[serde(default)]
    pub outputs: Vec<OutputDef>,
}

impl Flow {
    /// Validate the flow, collecting every problem rather than stopping at
    /// the first.
    pub fn validate(&self) -> Result<(), Vec<FlowError>> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        for action in &self.actions {
            if !seen.insert(action.id.as_str()) {
                errors.push(FlowError::Validation {
                    field: format!("actions[{}].id", action.id),
                    message: "duplicate action id".into(),
                });
            }
            if action.executor.trim().is_empty() {
                errors.push(FlowError::Validation {
                    field: format!("actions[{}].executor", action.id),
                    message: "executor key must not be empty".into(),
                });
            }
            for var in &action.variables {
                if let Err(message) = check_braces(&var.value) {
                    errors.push(FlowError::Validation {
                        field: format!("actions[{}].variables.{}", action.id, var.name),
                        message,
                    });
                }
            }
            if let Some(cond) = &action.condition {
                if let Err(message) = check_braces(cond) {
                    errors.push(FlowError::Validation {
                        field: format!("actions[{}].condition", action.id),
                        message,
                    });
                }
            }
            for (idx, node) in action.on.iter().enumerate() {
                if node.name.trim().is_empty() {
                    errors.push(FlowError::Validation {
                        field: format!("actions[{}].on[{idx}].name", action.id),
                        message: "node reference has no name and cannot be resolved".into(),
                    });
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn action(&self, id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Every node name referenced by any action's `on` list (used by the
    /// cron pre-enqueue hook to batch-resolve node records).
    pub fn referenced_node_names(&self) -> HashSet<&str> {
        self.actions
            .iter()
            .flat_map(|a| a.on.iter())
            .map(|n| n.name.as_str())
            .collect()
    }
}

/// Balanced-brace check for `{{ expr }}` interpolation markers. Only checks
/// delimiter balance; expression syntax is validated by the evaluator at run
/// time.
fn check_braces(s: &str) -> Result<(), String> {
    let mut depth = 0i32;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next();
            depth += 1;
        } else if c == '}' && chars.peek() == Some(&'}') {
            chars.next();
            depth -= 1;
            if depth < 0 {
                return Err("unmatched '}}' in interpolation expression".into());
            }
        }
    }
    if depth != 0 {
        return Err("unmatched '{{' in interpolation expression".into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
