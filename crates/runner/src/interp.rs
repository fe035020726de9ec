// SPDX-License-Identifier: MIT

//! `{{ expr }}` interpolation and action condition evaluation. Expressions
//! run through `jexl-eval` against an environment of
//! `{input: ..., secrets: ...}`.

use crate::error::RunnerError;
use jexl_eval::Evaluator;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Build the evaluation environment shared by every expression in one
/// execution: `input.<name>` from the triggering payload, `secrets.<name>`
/// from the namespace/flow secret map — the engine never talks to the
/// secret store itself, it is handed an already-resolved map.
pub fn build_context(input: &HashMap<String, Value>, secrets: &HashMap<String, String>) -> Value {
    let mut root = Map::new();
    root.insert("input".to_string(), Value::Object(input.clone().into_iter().collect()));
    let secrets_obj: Map<String, Value> =
        secrets.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect();
    root.insert("secrets".to_string(), Value::Object(secrets_obj));
    Value::Object(root)
}

/// A variable value is either a literal or a single `{{ expr }}` wrapping the
/// whole string — partial interpolation inside a
/// larger literal is not part of the language.
fn extract_expr(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let inner = trimmed.strip_prefix("{{")?.strip_suffix("}}")?;
    Some(inner.trim())
}

/// Resolve one variable value against `context`. Literals pass through
/// unchanged; a `{{ expr }}` value is evaluated and coerced to a string —
/// the runner owns the string coercion, not the expression language.
pub fn interpolate(field: &str, value: &str, context: &Value) -> Result<String, RunnerError> {
    let Some(expr) = extract_expr(value) else {
        return Ok(value.to_string());
    };
    let evaluated = Evaluator::new()
        .eval_in_context(expr, context)
        .map_err(|source| RunnerError::Expression { field: field.to_string(), source })?;
    Ok(coerce_to_string(&evaluated))
}

/// Evaluate an action's `condition` expression; a false result skips the
/// action without failing it. The expression must produce a boolean;
/// anything else is a flow authoring error.
pub fn evaluate_condition(field: &str, expr: &str, context: &Value) -> Result<bool, RunnerError> {
    let evaluated = Evaluator::new()
        .eval_in_context(expr, context)
        .map_err(|source| RunnerError::Expression { field: field.to_string(), source })?;
    evaluated.as_bool().ok_or_else(|| RunnerError::NonBooleanCondition { field: field.to_string() })
}

fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "interp_tests.rs"]
mod tests;
