//! Template tokens and `%{token}` interpolation.
//!
//! Every message gets `name`, `rule`, `value` and `arg_type`, plus one
//! token per named predicate argument. List arguments render comma-joined.
//! `size?` with a `{"min", "max"}` argument is the one range-aware case:
//! its `arg_type` is `range` and it also supplies `left` and `right`.

use std::collections::BTreeMap;

use serde_json::Value;
use sieve_eval::builtins::SizeArg;

pub const DEFAULT_ARG_TYPE: &str = "default";
pub const RANGE_ARG_TYPE: &str = "range";

pub type Tokens = BTreeMap<String, String>;

/// `range` for a ranged `size?`, `default` for everything else.
pub fn arg_type(predicate: &str, args: &[(String, Value)]) -> &'static str {
    match (predicate, range_of(predicate, args)) {
        ("size?", Some(_)) => RANGE_ARG_TYPE,
        _ => DEFAULT_ARG_TYPE,
    }
}

fn range_of(predicate: &str, args: &[(String, Value)]) -> Option<(usize, usize)> {
    if predicate != "size?" {
        return None;
    }
    let (_, size) = args.iter().find(|(name, _)| name == "size")?;
    match SizeArg::from_value(size)? {
        SizeArg::Range { min, max } => Some((min, max)),
        SizeArg::Exact(_) => None,
    }
}

/// Build the token table for one message.
pub fn build(
    name: &str,
    rule: Option<&str>,
    value: &Value,
    predicate: &str,
    args: &[(String, Value)],
) -> Tokens {
    let mut tokens = Tokens::new();
    for (arg, v) in args {
        tokens.insert(arg.clone(), render(v));
    }
    if let Some((left, right)) = range_of(predicate, args) {
        tokens.insert("left".to_string(), left.to_string());
        tokens.insert("right".to_string(), right.to_string());
    }
    tokens.insert("name".to_string(), name.to_string());
    tokens.insert("rule".to_string(), rule.unwrap_or_default().to_string());
    tokens.insert("value".to_string(), render(value));
    tokens.insert("arg_type".to_string(), arg_type(predicate, args).to_string());
    tokens
}

/// Text form of a value inside a message.
pub fn render(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Replace every `%{token}` found in `tokens`; unknown tokens stay verbatim.
pub fn interpolate(template: &str, tokens: &Tokens) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let token = &after[..end];
                match tokens.get(token) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 1]),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
