//! Deserialization from tagged-array JSON into typed ASTs.
//!
//! Entry points are [`rules_from_json`] (a list of top-level rule nodes),
//! [`rule_ast_from_json`] (a single rule node) and [`error_ast_from_json`].
//! Unknown tags are rejected: a dropped node would silently weaken a schema.

use serde_json::Value;

use crate::types::*;

/// Errors during interchange JSON deserialization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterchangeError {
    /// The value is not a `[tag, payload]` pair.
    #[error("expected a [tag, payload] node, got {found}")]
    NotANode { found: String },
    /// The tag is not part of the format.
    #[error("unknown node tag '{tag}'")]
    UnknownTag { tag: String },
    /// The payload does not have the shape required by its tag.
    #[error("malformed '{tag}' node: {message}")]
    Malformed { tag: String, message: String },
    /// A list of nodes was expected.
    #[error("expected a list of rule nodes, got {found}")]
    NotAList { found: String },
}

/// Deserialize a list of top-level rule nodes.
pub fn rules_from_json(v: &Value) -> Result<Vec<RuleAst>, InterchangeError> {
    let items = v.as_array().ok_or_else(|| InterchangeError::NotAList {
        found: describe(v),
    })?;
    items.iter().map(rule_ast_from_json).collect()
}

/// Deserialize a single rule node.
pub fn rule_ast_from_json(v: &Value) -> Result<RuleAst, InterchangeError> {
    let (tag, payload) = split_node(v)?;

    if let Some(op) = Connective::from_tag(tag) {
        let [left, right] = pair(tag, payload)?;
        return Ok(RuleAst::Composite {
            op,
            left: Box::new(rule_ast_from_json(left)?),
            right: Box::new(rule_ast_from_json(right)?),
        });
    }

    match tag {
        "predicate" => {
            let (id, args) = parse_predicate(payload)?;
            Ok(RuleAst::Predicate { id, args })
        }
        "not" => Ok(RuleAst::Not(Box::new(rule_ast_from_json(payload)?))),
        "val" => {
            let [name, node] = pair(tag, payload)?;
            Ok(RuleAst::Val {
                name: optional_name(tag, name)?,
                node: Box::new(rule_ast_from_json(node)?),
            })
        }
        "key" => {
            let [name, node] = pair(tag, payload)?;
            Ok(RuleAst::Key {
                name: required_name(tag, name)?,
                node: Box::new(rule_ast_from_json(node)?),
            })
        }
        "each" => {
            let [name, node] = pair(tag, payload)?;
            Ok(RuleAst::Each {
                name: optional_name(tag, name)?,
                node: Box::new(rule_ast_from_json(node)?),
            })
        }
        "set" => {
            let [name, nodes] = pair(tag, payload)?;
            let nodes = nodes.as_array().ok_or_else(|| malformed(tag, "children must be a list"))?;
            Ok(RuleAst::Set {
                name: optional_name(tag, name)?,
                nodes: nodes
                    .iter()
                    .map(rule_ast_from_json)
                    .collect::<Result<_, _>>()?,
            })
        }
        "group" => {
            let items = payload
                .as_array()
                .filter(|a| a.len() == 3)
                .ok_or_else(|| malformed(tag, "expected [name, [names], node]"))?;
            let names = items[1]
                .as_array()
                .ok_or_else(|| malformed(tag, "names must be a list"))?
                .iter()
                .map(|n| required_name(tag, n))
                .collect::<Result<Vec<_>, _>>()?;
            if names.is_empty() {
                return Err(malformed(tag, "names must not be empty"));
            }
            Ok(RuleAst::Group {
                name: required_name(tag, &items[0])?,
                names,
                node: Box::new(rule_ast_from_json(&items[2])?),
            })
        }
        "check" => {
            let items = payload
                .as_array()
                .filter(|a| a.len() == 3)
                .ok_or_else(|| malformed(tag, "expected [name, [key paths], node]"))?;
            let keys = items[1]
                .as_array()
                .ok_or_else(|| malformed(tag, "key paths must be a list"))?
                .iter()
                .map(|path| key_path(tag, path))
                .collect::<Result<Vec<_>, _>>()?;
            if keys.is_empty() {
                return Err(malformed(tag, "key paths must not be empty"));
            }
            Ok(RuleAst::Check {
                name: required_name(tag, &items[0])?,
                keys,
                node: Box::new(rule_ast_from_json(&items[2])?),
            })
        }
        other => Err(InterchangeError::UnknownTag {
            tag: other.to_string(),
        }),
    }
}

/// Deserialize an error AST node.
pub fn error_ast_from_json(v: &Value) -> Result<ErrorAst, InterchangeError> {
    let (tag, payload) = split_node(v)?;

    match tag {
        "input" => {
            let items = payload
                .as_array()
                .filter(|a| a.len() == 3)
                .ok_or_else(|| malformed(tag, "expected [name, value, [nodes]]"))?;
            let nodes = items[2]
                .as_array()
                .ok_or_else(|| malformed(tag, "nodes must be a list"))?;
            Ok(ErrorAst::Input {
                name: optional_name(tag, &items[0])?,
                value: items[1].clone(),
                nodes: nodes
                    .iter()
                    .map(error_ast_from_json)
                    .collect::<Result<_, _>>()?,
            })
        }
        "predicate" => {
            let (id, args) = parse_predicate(payload)?;
            Ok(ErrorAst::Predicate { id, args })
        }
        "not" => Ok(ErrorAst::Not(Box::new(error_ast_from_json(payload)?))),
        "set" | "each" => {
            let nodes = payload
                .as_array()
                .ok_or_else(|| malformed(tag, "children must be a list"))?
                .iter()
                .map(error_ast_from_json)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(if tag == "set" {
                ErrorAst::Set(nodes)
            } else {
                ErrorAst::Each(nodes)
            })
        }
        "el" => {
            let [index, node] = pair(tag, payload)?;
            let index = index
                .as_u64()
                .ok_or_else(|| malformed(tag, "index must be a non-negative integer"))?;
            Ok(ErrorAst::El {
                index: index as usize,
                node: Box::new(error_ast_from_json(node)?),
            })
        }
        "check" => {
            let [name, node] = pair(tag, payload)?;
            Ok(ErrorAst::Check {
                name: required_name(tag, name)?,
                node: Box::new(error_ast_from_json(node)?),
            })
        }
        "xor" => {
            let [left, right] = pair(tag, payload)?;
            Ok(ErrorAst::Xor(
                Box::new(error_ast_from_json(left)?),
                Box::new(error_ast_from_json(right)?),
            ))
        }
        other => Err(InterchangeError::UnknownTag {
            tag: other.to_string(),
        }),
    }
}

// ── Parsing helpers ─────────────────────────────────────────────────

fn split_node(v: &Value) -> Result<(&str, &Value), InterchangeError> {
    match v.as_array().map(Vec::as_slice) {
        Some([tag, payload]) => tag
            .as_str()
            .map(|t| (t, payload))
            .ok_or_else(|| InterchangeError::NotANode { found: describe(v) }),
        _ => Err(InterchangeError::NotANode { found: describe(v) }),
    }
}

fn pair<'a>(tag: &str, payload: &'a Value) -> Result<[&'a Value; 2], InterchangeError> {
    match payload.as_array().map(Vec::as_slice) {
        Some([a, b]) => Ok([a, b]),
        _ => Err(malformed(tag, "expected a two-element payload")),
    }
}

fn parse_predicate(payload: &Value) -> Result<(String, Args), InterchangeError> {
    let [id, args] = pair("predicate", payload)?;
    let id = id
        .as_str()
        .ok_or_else(|| malformed("predicate", "id must be a string"))?
        .to_string();
    let args = args
        .as_array()
        .ok_or_else(|| malformed("predicate", &format!("'{}' args must be a list", id)))?
        .iter()
        .map(|arg| match arg.as_array().map(Vec::as_slice) {
            Some([name, value]) => name
                .as_str()
                .map(|n| (n.to_string(), value.clone()))
                .ok_or_else(|| {
                    malformed("predicate", &format!("'{}' arg name must be a string", id))
                }),
            _ => Err(malformed(
                "predicate",
                &format!("'{}' args must be [name, value] pairs", id),
            )),
        })
        .collect::<Result<Args, _>>()?;
    Ok((id, args))
}

fn optional_name(tag: &str, v: &Value) -> Result<Option<String>, InterchangeError> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(malformed(tag, "name must be a string or null")),
    }
}

fn required_name(tag: &str, v: &Value) -> Result<String, InterchangeError> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| malformed(tag, "name must be a string"))
}

fn key_path(tag: &str, v: &Value) -> Result<KeyPath, InterchangeError> {
    let keys = v
        .as_array()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| malformed(tag, "a key path must be a non-empty list of keys"))?;
    keys.iter().map(|k| required_name(tag, k)).collect()
}

fn malformed(tag: &str, message: &str) -> InterchangeError {
    InterchangeError::Malformed {
        tag: tag.to_string(),
        message: message.to_string(),
    }
}

fn describe(v: &Value) -> String {
    let text = v.to_string();
    if text.len() > 60 {
        format!("{}...", &text[..text.char_indices().nth(57).map_or(text.len(), |(i, _)| i)])
    } else {
        text
    }
}
