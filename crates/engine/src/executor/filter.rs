//! Filter conditions used by `control.filter` steps.
//!
//! Operands arrive as resolved JSON parameter values (usually strings). Comparisons follow
//! the loose semantics authors expect from the workflow editor:
//!
//! - `contains` / `not_contains`: case-insensitive substring test on the stringified operands
//! - `equals` / `not_equals`: loose equality (`"3"` equals `3`, `true` equals `1`)
//! - `greater_than` / `less_than`: both operands coerced to numbers; anything non-numeric
//!   compares false

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// A recognized filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCondition {
    Contains,
    NotContains,
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
}

/// Raised for condition names outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCondition(pub String);

impl fmt::Display for UnknownCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown filter condition: {}", self.0)
    }
}

impl std::error::Error for UnknownCondition {}

impl FromStr for FilterCondition {
    type Err = UnknownCondition;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "contains" => Ok(FilterCondition::Contains),
            "not_contains" => Ok(FilterCondition::NotContains),
            "equals" => Ok(FilterCondition::Equals),
            "not_equals" => Ok(FilterCondition::NotEquals),
            "greater_than" => Ok(FilterCondition::GreaterThan),
            "less_than" => Ok(FilterCondition::LessThan),
            other => Err(UnknownCondition(other.to_string())),
        }
    }
}

impl FilterCondition {
    /// Parses the `condition` parameter of a filter step. A missing or non-string value is unknown.
    pub fn from_parameter(condition: Option<&Value>) -> Result<Self, UnknownCondition> {
        match condition {
            Some(Value::String(name)) => name.parse(),
            Some(other) => Err(UnknownCondition(display_operand(Some(other)))),
            None => Err(UnknownCondition("<none>".to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterCondition::Contains => "contains",
            FilterCondition::NotContains => "not_contains",
            FilterCondition::Equals => "equals",
            FilterCondition::NotEquals => "not_equals",
            FilterCondition::GreaterThan => "greater_than",
            FilterCondition::LessThan => "less_than",
        }
    }

    /// Evaluates the condition with `input` on the left and `value` on the right.
    pub fn evaluate(self, input: Option<&Value>, value: Option<&Value>) -> bool {
        match self {
            FilterCondition::Contains => contains_ignoring_case(input, value),
            FilterCondition::NotContains => !contains_ignoring_case(input, value),
            FilterCondition::Equals => loose_equals(input, value),
            FilterCondition::NotEquals => !loose_equals(input, value),
            FilterCondition::GreaterThan => to_number(input) > to_number(value),
            FilterCondition::LessThan => to_number(input) < to_number(value),
        }
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stringifies an operand; a missing operand is the empty string.
pub fn display_operand(operand: Option<&Value>) -> String {
    match operand {
        None => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) => "null".to_string(),
        Some(other) => other.to_string(),
    }
}

fn contains_ignoring_case(input: Option<&Value>, value: Option<&Value>) -> bool {
    let haystack = display_operand(input).to_lowercase();
    let needle = display_operand(value).to_lowercase();
    haystack.contains(&needle)
}

/// Loose equality over JSON scalars; a missing operand behaves like `null`.
fn loose_equals(left: Option<&Value>, right: Option<&Value>) -> bool {
    let left = left.unwrap_or(&Value::Null);
    let right = right.unwrap_or(&Value::Null);
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(_), Value::Number(_)) => to_number(Some(left)) == to_number(Some(right)),
        (Value::Array(_) | Value::Object(_), Value::Array(_) | Value::Object(_)) => left == right,
        (Value::Array(_) | Value::Object(_), _) => loose_equals(Some(&Value::String(display_operand(Some(left)))), Some(right)),
        (_, Value::Array(_) | Value::Object(_)) => loose_equals(Some(left), Some(&Value::String(display_operand(Some(right))))),
        // Remaining pairs mix strings, numbers and booleans: compare numerically.
        _ => to_number(Some(left)) == to_number(Some(right)),
    }
}

/// Numeric coercion: trimmed strings parse as decimals, signed `Infinity`, or unsigned
/// `0x`/`0o`/`0b` integers (empty is 0), booleans are 0/1, `null` is 0, and anything
/// unparseable or missing is NaN.
fn to_number(operand: Option<&Value>) -> f64 {
    match operand {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(flag)) => f64::from(u8::from(*flag)),
        Some(Value::Number(number)) => number.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(text)) => parse_numeric_text(text),
        Some(Value::Array(_) | Value::Object(_)) => f64::NAN,
    }
}

fn parse_numeric_text(text: &str) -> f64 {
    let trimmed = text.trim();
    match trimmed {
        "" => return 0.0,
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(value) = parse_prefixed_integer(trimmed) {
        return value;
    }
    // Rust accepts spellings like "inf" and "nan" that should not count as numbers here.
    if trimmed.chars().any(|character| character.is_ascii_alphabetic() && !matches!(character, 'e' | 'E')) {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parses `0x`, `0o` and `0b` literals. Returns `None` when `text` carries no such prefix.
fn parse_prefixed_integer(text: &str) -> Option<f64> {
    let radix = match text.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &text[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }
    let value = digits
        .chars()
        .try_fold(0.0_f64, |total, character| {
            character.to_digit(radix).map(|digit| total * f64::from(radix) + f64::from(digit))
        })
        .unwrap_or(f64::NAN);
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(condition: &str, input: Value, value: Value) -> bool {
        condition
            .parse::<FilterCondition>()
            .expect("known condition")
            .evaluate(Some(&input), Some(&value))
    }

    #[test]
    fn contains_is_case_insensitive() {
        assert!(eval("contains", json!("Important: SALES enquiry"), json!("sales")));
        assert!(!eval("contains", json!("tech"), json!("sales")));
        assert!(eval("not_contains", json!("tech"), json!("sales")));
        assert!(eval("contains", json!(12345), json!("234")));
    }

    #[test]
    fn equality_is_loose() {
        assert!(eval("equals", json!("3"), json!(3)));
        assert!(eval("equals", json!(" 3 "), json!(3)));
        assert!(eval("equals", json!(true), json!("1")));
        assert!(eval("equals", json!("sales"), json!("sales")));
        assert!(!eval("equals", json!("Sales"), json!("sales")));
        assert!(eval("not_equals", json!("a"), json!("b")));
        assert!(!eval("equals", json!(null), json!(0)));
        assert!(eval("equals", json!([1, 2]), json!([1, 2])));
        assert!(eval("equals", json!("0x10"), json!(16)));
        assert!(eval("equals", json!("0b101"), json!("5")));
        assert!(eval("equals", json!("Infinity"), json!("+Infinity")));
        assert!(!eval("equals", json!("-0x10"), json!(-16)));
    }

    #[test]
    fn missing_operands_compare_like_null() {
        let condition = FilterCondition::Equals;
        assert!(condition.evaluate(None, Some(&Value::Null)));
        assert!(!condition.evaluate(None, Some(&json!(""))));
        assert!(FilterCondition::Contains.evaluate(Some(&json!("anything")), None));
    }

    #[test]
    fn numeric_comparisons_coerce_operands() {
        assert!(eval("greater_than", json!("10"), json!("9")));
        assert!(eval("less_than", json!("2.5"), json!(3)));
        assert!(eval("greater_than", json!(""), json!(-1)));
        assert!(!eval("greater_than", json!("ten"), json!(1)));
        assert!(!eval("less_than", json!("ten"), json!(1)));
        assert!(!eval("greater_than", json!("inf"), json!(1)));
        assert!(eval("greater_than", json!("1e3"), json!(999)));
        assert!(eval("greater_than", json!("Infinity"), json!(5)));
        assert!(eval("less_than", json!(" -Infinity "), json!(-1e300)));
        assert!(eval("greater_than", json!("0x10"), json!(15)));
        assert!(eval("greater_than", json!("0o7"), json!(6)));
        assert!(eval("less_than", json!("0b101"), json!(6)));
        assert!(!eval("greater_than", json!("infinity"), json!(1)));
        assert!(!eval("greater_than", json!("nan"), json!(-1)));
        assert!(!eval("greater_than", json!("0x"), json!(-1)));
        assert!(!eval("greater_than", json!("0xZZ"), json!(-1)));
    }

    #[test]
    fn unknown_conditions_are_rejected() {
        let error = "between".parse::<FilterCondition>().unwrap_err();
        assert_eq!(error.to_string(), "Unknown filter condition: between");

        let missing = FilterCondition::from_parameter(None).unwrap_err();
        assert_eq!(missing.to_string(), "Unknown filter condition: <none>");

        let numeric = FilterCondition::from_parameter(Some(&json!(5))).unwrap_err();
        assert_eq!(numeric.0, "5");
    }
}
