//! Serialization of typed ASTs back to tagged-array JSON.
//!
//! Output is canonical: `rule_ast_from_json(&rule_ast_to_json(ast))`
//! yields `ast` again.

use serde_json::{json, Value};

use crate::types::*;

pub fn rules_to_json(rules: &[RuleAst]) -> Value {
    Value::Array(rules.iter().map(rule_ast_to_json).collect())
}

pub fn rule_ast_to_json(ast: &RuleAst) -> Value {
    let payload = match ast {
        RuleAst::Predicate { id, args } => predicate_payload(id, args),
        RuleAst::Not(node) => rule_ast_to_json(node),
        RuleAst::Val { name, node } | RuleAst::Each { name, node } => {
            json!([name, rule_ast_to_json(node)])
        }
        RuleAst::Key { name, node } => json!([name, rule_ast_to_json(node)]),
        RuleAst::Set { name, nodes } => {
            json!([name, nodes.iter().map(rule_ast_to_json).collect::<Vec<_>>()])
        }
        RuleAst::Composite { left, right, .. } => {
            json!([rule_ast_to_json(left), rule_ast_to_json(right)])
        }
        RuleAst::Group { name, names, node } => json!([name, names, rule_ast_to_json(node)]),
        RuleAst::Check { name, keys, node } => json!([name, keys, rule_ast_to_json(node)]),
    };
    json!([ast.tag(), payload])
}

pub fn error_ast_to_json(ast: &ErrorAst) -> Value {
    let payload = match ast {
        ErrorAst::Input { name, value, nodes } => json!([
            name,
            value,
            nodes.iter().map(error_ast_to_json).collect::<Vec<_>>()
        ]),
        ErrorAst::Predicate { id, args } => predicate_payload(id, args),
        ErrorAst::Not(node) => error_ast_to_json(node),
        ErrorAst::Set(nodes) | ErrorAst::Each(nodes) => {
            Value::Array(nodes.iter().map(error_ast_to_json).collect())
        }
        ErrorAst::El { index, node } => json!([index, error_ast_to_json(node)]),
        ErrorAst::Check { name, node } => json!([name, error_ast_to_json(node)]),
        ErrorAst::Xor(left, right) => json!([error_ast_to_json(left), error_ast_to_json(right)]),
    };
    json!([ast.tag(), payload])
}

fn predicate_payload(id: &str, args: &Args) -> Value {
    let args: Vec<Value> = args.iter().map(|(name, value)| json!([name, value])).collect();
    json!([id, args])
}
