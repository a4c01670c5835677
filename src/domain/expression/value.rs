//! Helpers for working with JSON values as expression operands

use std::cmp::Ordering;

use serde_json::{Number, Value};

/// Numeric view of a JSON number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Int(i) => Value::from(i),
            Self::Float(f) => float_value(f),
        }
    }
}

/// Read a value as a number, if it is one
pub fn as_num(value: &Value) -> Option<Num> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Num::Int)
            .or_else(|| n.as_f64().map(Num::Float)),
        _ => None,
    }
}

/// Convert a float into a JSON value, collapsing integral results to integers.
/// Non-finite results become `null`.
pub fn float_value(f: f64) -> Value {
    if !f.is_finite() {
        return Value::Null;
    }

    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        return Value::from(f as i64);
    }

    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Name of a value's type, used in error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "context",
    }
}

/// Structural equality where numbers compare by value (`1 = 1.0`)
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => match (as_num(left), as_num(right)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
            (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
            _ => false,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}

/// Ordering between two numbers or two strings; `None` for any other pairing
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => match (as_num(left)?, as_num(right)?) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Render a value as text the way the `string` function does
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => serde_json::to_string(value).ok(),
    }
}
