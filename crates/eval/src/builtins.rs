//! Built-in predicates installed by `PredicateRegistry::default()`.
//!
//! Every function receives its leading arguments followed by the subject.
//! Predicates never fail on unexpected shapes: a value of the wrong type
//! simply does not satisfy them.

use std::cmp::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::numeric;
use crate::registry::PredicateRegistry;
use crate::types::type_name;

/// Ids of the type-checking predicates.
pub const TYPE_PREDICATES: &[&str] = &[
    "none?",
    "str?",
    "int?",
    "float?",
    "decimal?",
    "number?",
    "bool?",
    "array?",
    "hash?",
    "date?",
    "date_time?",
    "type?",
];

pub fn install(registry: &mut PredicateRegistry) {
    // ── Types ──
    registry
        .register("none?", &[], |a| a[0].is_null())
        .register("str?", &[], |a| a[0].is_string())
        .register("int?", &[], |a| numeric::is_integer(&a[0]))
        .register("float?", &[], |a| a[0].is_f64())
        .register("decimal?", &[], |a| {
            a[0].as_str().and_then(numeric::parse_decimal).is_some()
        })
        .register("number?", &[], |a| a[0].is_number())
        .register("bool?", &[], |a| a[0].is_boolean())
        .register("array?", &[], |a| a[0].is_array())
        .register("hash?", &[], |a| a[0].is_object())
        .register("date?", &[], |a| a[0].as_str().is_some_and(is_date))
        .register("date_time?", &[], |a| {
            a[0].as_str()
                .is_some_and(|s| OffsetDateTime::parse(s, &Rfc3339).is_ok())
        })
        .register("type?", &["type"], |a| {
            a[0].as_str().is_some_and(|t| t == type_name(&a[1]))
        });

    // ── Presence ──
    registry
        .register("key?", &["name"], |a| match (&a[0], &a[1]) {
            (Value::String(name), Value::Object(map)) => map.contains_key(name),
            _ => false,
        })
        .register("filled?", &[], |a| !is_empty(&a[0]))
        .register("empty?", &[], |a| is_empty(&a[0]));

    // ── Comparison ──
    registry
        .register("gt?", &["num"], |a| ordering(a) == Some(Ordering::Greater))
        .register("gteq?", &["num"], |a| {
            matches!(ordering(a), Some(Ordering::Greater | Ordering::Equal))
        })
        .register("lt?", &["num"], |a| ordering(a) == Some(Ordering::Less))
        .register("lteq?", &["num"], |a| {
            matches!(ordering(a), Some(Ordering::Less | Ordering::Equal))
        })
        .register("eql?", &["left"], |a| values_equal(&a[0], &a[1]))
        .register("true?", &[], |a| a[0] == Value::Bool(true))
        .register("false?", &[], |a| a[0] == Value::Bool(false))
        .register("odd?", &[], |a| numeric::is_even(&a[0]) == Some(false))
        .register("even?", &[], |a| numeric::is_even(&a[0]) == Some(true));

    // ── Size ──
    registry
        .register("size?", &["size"], |a| {
            let Some(size) = numeric::size_of(&a[1]) else {
                return false;
            };
            match SizeArg::from_value(&a[0]) {
                Some(SizeArg::Exact(n)) => size == n,
                Some(SizeArg::Range { min, max }) => (min..=max).contains(&size),
                None => false,
            }
        })
        .register("min_size?", &["num"], |a| {
            matches!((numeric::as_count(&a[0]), numeric::size_of(&a[1])), (Some(n), Some(s)) if s >= n)
        })
        .register("max_size?", &["num"], |a| {
            matches!((numeric::as_count(&a[0]), numeric::size_of(&a[1])), (Some(n), Some(s)) if s <= n)
        });

    // ── Membership ──
    registry
        .register("included_in?", &["list"], |a| {
            a[0].as_array()
                .is_some_and(|list| list.iter().any(|v| values_equal(v, &a[1])))
        })
        .register("excluded_from?", &["list"], |a| {
            a[0].as_array()
                .is_some_and(|list| !list.iter().any(|v| values_equal(v, &a[1])))
        })
        .register("includes?", &["item"], |a| includes(&a[1], &a[0]) == Some(true))
        .register("excludes?", &["item"], |a| includes(&a[1], &a[0]) == Some(false));

    // ── Format ──
    let cache: Arc<DashMap<String, Option<Regex>>> = Arc::new(DashMap::new());
    registry.register("format?", &["regex"], move |a| {
        let (Some(pattern), Some(subject)) = (a[0].as_str(), a[1].as_str()) else {
            return false;
        };
        let regex = cache
            .entry(pattern.to_string())
            .or_insert_with(|| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(err) => {
                    tracing::warn!(pattern, error = %err, "invalid format? pattern");
                    None
                }
            });
        regex.value().as_ref().is_some_and(|re| re.is_match(subject))
    });
}

/// Normalized `size?` argument: an exact size or an inclusive range
/// written as `{"min": m, "max": n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeArg {
    Exact(usize),
    Range { min: usize, max: usize },
}

impl SizeArg {
    pub fn from_value(v: &Value) -> Option<SizeArg> {
        if let Some(n) = numeric::as_count(v) {
            return Some(SizeArg::Exact(n));
        }
        let map = v.as_object()?;
        let min = map.get("min").and_then(numeric::as_count)?;
        let max = map.get("max").and_then(numeric::as_count)?;
        Some(SizeArg::Range { min, max })
    }
}

/// Null, empty strings and empty collections are empty.
fn is_empty(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Subject compared against the leading argument.
fn ordering(a: &[Value]) -> Option<Ordering> {
    numeric::compare(&a[1], &a[0])
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match numeric::compare(left, right) {
        Some(ord) => ord == Ordering::Equal,
        None => left == right,
    }
}

/// Whether a string or array contains `item`. `None` for other subjects.
fn includes(subject: &Value, item: &Value) -> Option<bool> {
    match subject {
        Value::Array(items) => Some(items.iter().any(|v| values_equal(v, item))),
        Value::String(s) => item.as_str().map(|needle| s.contains(needle)),
        _ => None,
    }
}

fn is_date(s: &str) -> bool {
    Date::parse(s, format_description!("[year]-[month]-[day]")).is_ok()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
