//! Exact numeric comparison using `rust_decimal`.
//!
//! JSON numbers are converted through their textual form, so `0.1`
//! compares as exactly one tenth. No `f64` arithmetic is involved.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Number, Value};

/// Convert a JSON number to a Decimal. Returns `None` for values outside
/// the Decimal range.
pub fn number_to_decimal(n: &Number) -> Option<Decimal> {
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Numeric view of a value. Only JSON numbers qualify; numeric strings
/// are not coerced.
pub fn as_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => number_to_decimal(n),
        _ => None,
    }
}

/// Parse a decimal literal such as `"12.50"`.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s.trim()).ok()
}

/// Compare two values numerically. `None` when either side is not a number.
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    Some(as_decimal(left)?.cmp(&as_decimal(right)?))
}

/// Whether the value is an integral JSON number.
pub fn is_integer(v: &Value) -> bool {
    match v {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        _ => false,
    }
}

/// Integer remainder check used by `odd?` and `even?`.
pub fn is_even(v: &Value) -> Option<bool> {
    if !is_integer(v) {
        return None;
    }
    let d = as_decimal(v)?;
    Some((d % Decimal::TWO).is_zero())
}

/// Size of a value for the size predicates: character count for strings,
/// element count for arrays and hashes.
pub fn size_of(v: &Value) -> Option<usize> {
    match v {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(a) => Some(a.len()),
        Value::Object(o) => Some(o.len()),
        _ => None,
    }
}

/// Read a non-negative integer argument.
pub fn as_count(v: &Value) -> Option<usize> {
    v.as_u64().and_then(|n| usize::try_from(n).ok())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
