//! Rule compiler: builds rule trees from the rule AST.
//!
//! Compilation is a bottom-up recursive descent. Predicate ids are
//! resolved against the registry here, so an unknown id or a malformed
//! argument list fails before any input is seen.

use sieve_interchange::{Args, RuleAst};

use crate::predicate::{Predicate, INPUT_ARG};
use crate::registry::PredicateRegistry;
use crate::rule::Rule;
use crate::types::EvalError;

/// How many arguments a node supplies to its predicate at call time.
#[derive(Debug, Clone, Copy)]
enum Context {
    /// The subject.
    Value,
    /// The key name and the subject.
    Key,
    /// One value per named result or key path.
    Values(usize),
}

impl Context {
    fn supplied(self) -> usize {
        match self {
            Context::Value => 1,
            Context::Key => 2,
            Context::Values(n) => n,
        }
    }

    /// Position of the first AST argument among the predicate's leading args.
    fn offset(self) -> usize {
        match self {
            Context::Key => 1,
            _ => 0,
        }
    }
}

pub struct RuleCompiler<'a> {
    registry: &'a PredicateRegistry,
}

impl<'a> RuleCompiler<'a> {
    pub fn new(registry: &'a PredicateRegistry) -> Self {
        RuleCompiler { registry }
    }

    pub fn compile(&self, asts: &[RuleAst]) -> Result<Vec<Rule>, EvalError> {
        let rules = asts
            .iter()
            .map(|ast| self.compile_one(ast))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(rules = rules.len(), "compiled rule set");
        Ok(rules)
    }

    pub fn compile_one(&self, ast: &RuleAst) -> Result<Rule, EvalError> {
        self.visit(ast, None)
    }

    /// `scope` is the name inherited by bare predicates.
    fn visit(&self, ast: &RuleAst, scope: Option<&str>) -> Result<Rule, EvalError> {
        match ast {
            RuleAst::Predicate { .. } | RuleAst::Not(_) => Ok(Rule::value(
                scope,
                self.predicate(ast, Context::Value)?,
            )),

            RuleAst::Val { name, node } => {
                let name = name.as_deref();
                if is_predicate(node) {
                    Ok(Rule::value(name, self.predicate(node, Context::Value)?))
                } else {
                    self.visit(node, name.or(scope))
                }
            }

            RuleAst::Key { name, node } => {
                if !is_predicate(node) {
                    return Err(invalid(format!(
                        "key '{}' must wrap a predicate, got '{}'",
                        name,
                        node.tag()
                    )));
                }
                Ok(Rule::key(name.clone(), self.predicate(node, Context::Key)?))
            }

            RuleAst::Each { name, node } => {
                Ok(Rule::each(name.as_deref(), self.visit(node, None)?))
            }

            RuleAst::Set { name, nodes } => {
                let inner = name.as_deref().or(scope);
                let rules = nodes
                    .iter()
                    .map(|n| self.visit(n, inner))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Rule::set(name.as_deref(), rules))
            }

            RuleAst::Composite { op, left, right } => Ok(Rule::composite(
                *op,
                self.visit(left, scope)?,
                self.visit(right, scope)?,
            )),

            RuleAst::Group { name, names, node } => {
                if !is_predicate(node) {
                    return Err(invalid(format!("group '{}' must wrap a predicate", name)));
                }
                Ok(Rule::group(
                    name.clone(),
                    names.clone(),
                    self.predicate(node, Context::Values(names.len()))?,
                ))
            }

            RuleAst::Check { name, keys, node } => {
                if !is_predicate(node) {
                    return Err(invalid(format!("check '{}' must wrap a predicate", name)));
                }
                Ok(Rule::check(
                    name.clone(),
                    keys.clone(),
                    self.predicate(node, Context::Values(keys.len()))?,
                ))
            }
        }
    }

    fn predicate(&self, ast: &RuleAst, context: Context) -> Result<Predicate, EvalError> {
        match ast {
            RuleAst::Not(inner) => Ok(self.predicate(inner, context)?.negation()),
            RuleAst::Predicate { id, args } => {
                let def = self.registry.definition(id)?;
                let arity = def.arg_names.len() + 1;
                if context.supplied() > arity {
                    return Err(EvalError::Arity {
                        id: id.clone(),
                        expected: arity,
                        got: context.supplied() + args.len(),
                    });
                }
                let expected = arity - context.supplied();
                if args.len() != expected {
                    return Err(EvalError::Arity {
                        id: id.clone(),
                        expected,
                        got: args.len(),
                    });
                }
                check_arg_names(id, &def.arg_names, args, context.offset())?;
                Ok(def.instantiate().curry(args.iter().map(|(_, v)| v.clone())))
            }
            other => Err(invalid(format!(
                "expected a predicate, got '{}'",
                other.tag()
            ))),
        }
    }
}

fn check_arg_names(
    id: &str,
    declared: &[String],
    args: &Args,
    offset: usize,
) -> Result<(), EvalError> {
    for (i, (name, _)) in args.iter().enumerate() {
        let expected = declared
            .get(offset + i)
            .map(String::as_str)
            .unwrap_or(INPUT_ARG);
        if name != expected {
            return Err(EvalError::ArgumentName {
                id: id.to_string(),
                position: i,
                expected: expected.to_string(),
                got: name.clone(),
            });
        }
    }
    Ok(())
}

fn is_predicate(ast: &RuleAst) -> bool {
    match ast {
        RuleAst::Predicate { .. } => true,
        RuleAst::Not(inner) => is_predicate(inner),
        _ => false,
    }
}

fn invalid(message: String) -> EvalError {
    EvalError::InvalidSchema { message }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use sieve_interchange::{rule_ast_from_json, rules_from_json, Connective};

    fn compile(v: Value) -> Result<Vec<Rule>, EvalError> {
        let registry = PredicateRegistry::default();
        let asts = rules_from_json(&v)?;
        RuleCompiler::new(&registry).compile(&asts)
    }

    fn canonical(v: Value) -> Value {
        let registry = PredicateRegistry::default();
        let ast = rule_ast_from_json(&v).unwrap();
        let rule = RuleCompiler::new(&registry).compile_one(&ast).unwrap();
        sieve_interchange::rule_ast_to_json(&rule.to_ast())
    }

    #[test]
    fn compiles_key_and_value_chain() {
        let rules = compile(json!([
            ["and", [
                ["key", ["age", ["predicate", ["key?", []]]]],
                ["val", ["age", ["predicate", ["gt?", [["num", 18]]]]]]
            ]]
        ]))
        .unwrap();
        let Rule::Composite { op, left, right, .. } = &rules[0] else {
            panic!("expected composite");
        };
        assert_eq!(*op, Connective::And);
        assert!(matches!(**left, Rule::Key { ref name, .. } if name == "age"));
        assert_eq!(right.predicate().unwrap().args(), &[json!(18)]);
    }

    #[test]
    fn canonical_ast_round_trips() {
        let ast = json!(["and", [
            ["key", ["email", ["predicate", ["key?", []]]]],
            ["set", ["email", [
                ["val", ["email", ["predicate", ["filled?", []]]]],
                ["val", ["email", ["not", ["predicate", ["eql?", [["left", "root"]]]]]]]
            ]]]
        ]]);
        assert_eq!(canonical(ast.clone()), ast);

        let group = json!(["group", ["confirmation", ["password", "confirmation"],
            ["predicate", ["eql?", []]]]]);
        assert_eq!(canonical(group.clone()), group);

        let check = json!(["check", ["shipping", [["address", "country"]],
            ["predicate", ["included_in?", [["list", ["PL", "DE"]]]]]]]);
        assert_eq!(canonical(check.clone()), check);
    }

    #[test]
    fn bare_predicates_inherit_the_enclosing_name() {
        let out = canonical(json!(["val", ["age", ["or", [
            ["predicate", ["none?", []]],
            ["predicate", ["int?", []]]
        ]]]]));
        assert_eq!(
            out,
            json!(["or", [
                ["val", ["age", ["predicate", ["none?", []]]]],
                ["val", ["age", ["predicate", ["int?", []]]]]
            ]])
        );
    }

    #[test]
    fn unknown_predicate_is_named() {
        let err = compile(json!([["val", ["age", ["predicate", ["adult?", []]]]]])).unwrap_err();
        assert_eq!(err.to_string(), "unknown predicate 'adult?'");
    }

    #[test]
    fn arity_is_checked_per_context() {
        let err = compile(json!([["val", ["age", ["predicate", ["gt?", []]]]]])).unwrap_err();
        assert!(matches!(err, EvalError::Arity { ref id, expected: 1, got: 0 } if id == "gt?"));

        let err = compile(json!([["key", ["age", ["predicate", ["key?", [["name", "age"]]]]]]]))
            .unwrap_err();
        assert!(matches!(err, EvalError::Arity { expected: 0, got: 1, .. }));
    }

    #[test]
    fn argument_names_must_match() {
        let err = compile(json!([["val", ["age", ["predicate", ["gt?", [["min", 18]]]]]]]))
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::ArgumentName {
                id: "gt?".to_string(),
                position: 0,
                expected: "num".to_string(),
                got: "min".to_string(),
            }
        );
    }

    #[test]
    fn check_arity_counts_key_paths() {
        let err = compile(json!([["check", ["terms", [["terms"]],
            ["predicate", ["true?", [["input", true]]]]]]]))
        .unwrap_err();
        assert!(matches!(err, EvalError::Arity { expected: 0, got: 1, .. }));

        assert!(compile(json!([["check", ["pair", [["a"], ["b"]],
            ["predicate", ["eql?", []]]]]]))
        .is_ok());
    }

    #[test]
    fn key_must_wrap_a_predicate() {
        let err = compile(json!([["key", ["age", ["set", [null, []]]]]])).unwrap_err();
        assert!(matches!(err, EvalError::InvalidSchema { .. }));
    }

    #[test]
    fn malformed_documents_surface_interchange_errors() {
        assert!(matches!(
            compile(json!([["maybe", []]])),
            Err(EvalError::Interchange(_))
        ));
    }
}
