//! # Placeholder Resolution
//!
//! Step parameters may reference outputs of earlier steps with the persisted placeholder
//! syntax `{{outputs.<stepId>.<outputId>}}` (identifiers use letters, digits, `_` and `-`).
//! Resolution is a pure function of the parameter value and the outputs recorded so far:
//!
//! - Only string values are scanned; every other JSON value is returned unchanged.
//! - A placeholder whose step or output is unknown (or whose value is `null`) stays in the
//!   string verbatim. Callers that want to flag those use [`find_unresolved_placeholders`].
//! - Resolved values are stringified: strings as-is, numbers and booleans via their display
//!   form (integral floats drop the fraction), arrays and objects as compact JSON.
//!
//! ## Usage
//!
//! ```rust
//! use agentflow_engine::resolve::resolve_value;
//! use agentflow_types::StepOutputs;
//! use serde_json::json;
//!
//! let mut outputs = StepOutputs::new();
//! outputs.insert("trigger".into(), json!({"subject": "Hello"}).as_object().unwrap().clone());
//!
//! let resolved = resolve_value(&json!("Re: {{outputs.trigger.subject}}"), &outputs);
//! assert_eq!(resolved, json!("Re: Hello"));
//! ```

use agentflow_types::StepOutputs;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Number, Value};

static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{outputs\.([a-zA-Z0-9_-]+)\.([a-zA-Z0-9_-]+)\}\}").expect("placeholder pattern compiles"));

/// Substitutes placeholders in a single parameter value.
pub fn resolve_value(value: &Value, outputs: &StepOutputs) -> Value {
    match value {
        Value::String(text) => Value::String(resolve_placeholders(text, outputs)),
        other => other.clone(),
    }
}

/// Resolves every value of a step's parameter map into a new map, preserving key order.
pub fn resolve_parameters(parameters: &IndexMap<String, Value>, outputs: &StepOutputs) -> IndexMap<String, Value> {
    parameters
        .iter()
        .map(|(key, value)| (key.clone(), resolve_value(value, outputs)))
        .collect()
}

/// Replaces each resolvable placeholder in `text`, leaving the rest untouched.
pub fn resolve_placeholders(text: &str, outputs: &StepOutputs) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(text, |captures: &Captures| match lookup(captures, outputs) {
            Some(value) => format_output_value(value),
            None => captures[0].to_string(),
        })
        .into_owned()
}

/// Lists the placeholder expressions in `value` that cannot be resolved against `outputs`.
///
/// Expressions are returned with their delimiters, in order of appearance.
pub fn find_unresolved_placeholders(value: &Value, outputs: &StepOutputs) -> Vec<String> {
    let Value::String(text) = value else {
        return Vec::new();
    };
    PLACEHOLDER_PATTERN
        .captures_iter(text)
        .filter(|captures| lookup(captures, outputs).is_none())
        .map(|captures| captures[0].to_string())
        .collect()
}

/// Collects unresolved placeholders across a parameter map without duplicates.
pub fn find_unresolved_in_parameters(parameters: &IndexMap<String, Value>, outputs: &StepOutputs) -> Vec<String> {
    let mut unresolved: Vec<String> = Vec::new();
    for value in parameters.values() {
        for expression in find_unresolved_placeholders(value, outputs) {
            if !unresolved.contains(&expression) {
                unresolved.push(expression);
            }
        }
    }
    unresolved
}

fn lookup<'a>(captures: &Captures, outputs: &'a StepOutputs) -> Option<&'a Value> {
    outputs
        .get(&captures[1])
        .and_then(|step_outputs| step_outputs.get(&captures[2]))
        .filter(|value| !value.is_null())
}

fn format_output_value(value: &Value) -> String {
    match value {
        Value::String(string_value) => string_value.clone(),
        Value::Number(number_value) => format_number(number_value),
        Value::Bool(boolean_value) => boolean_value.to_string(),
        Value::Null => String::new(),
        other_value => other_value.to_string(),
    }
}

/// Integral floats print without a fraction, so `1.0` reads as `1`.
fn format_number(number: &Number) -> String {
    match number.as_f64() {
        Some(float) if number.is_f64() && float == 0.0 => "0".to_string(),
        Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < 1e21 => format!("{float:.0}"),
        _ => number.to_string(),
    }
}
