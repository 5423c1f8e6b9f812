//! Sieve rule evaluator: predicates, the rule node algebra, results and
//! the rule compiler.
//!
//! Rule trees are compiled once from the tagged-array rule AST (or built
//! directly with the [`Rule`] constructors and combinators) and then
//! evaluated per input. Validation failures are data on [`RuleResult`];
//! only configuration errors surface as [`EvalError`].

pub mod builtins;
pub mod compiler;
pub mod numeric;
pub mod predicate;
pub mod registry;
pub mod result;
pub mod rule;
pub mod schema;
pub mod types;

pub use compiler::RuleCompiler;
pub use predicate::{Predicate, PredicateFn};
pub use registry::{PredicateDef, PredicateRegistry};
pub use result::{ResultKind, RuleResult};
pub use rule::{Binding, EvalContext, Rule};
pub use schema::{Schema, SchemaResult};
pub use types::{EvalError, Subject};

use sieve_interchange::ErrorAst;

/// Owned outcome of a one-shot evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalOutcome {
    pub success: bool,
    pub error_ast: Vec<ErrorAst>,
}

/// Compile a JSON rule document with the built-in registry and evaluate
/// it against `input`.
///
/// For repeated validation, compile a [`Schema`] once and call it instead.
pub fn evaluate(
    rules: &serde_json::Value,
    input: &serde_json::Value,
) -> Result<EvalOutcome, EvalError> {
    let registry = PredicateRegistry::default();
    let schema = Schema::from_json(rules, &registry)?;
    let result = schema.call(input)?;
    Ok(EvalOutcome {
        success: result.success(),
        error_ast: result.error_ast(),
    })
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn evaluate_reports_failures_as_data() {
        let rules = json!([
            ["and", [
                ["key", ["email", ["predicate", ["key?", []]]]],
                ["val", ["email", ["predicate", ["filled?", []]]]]
            ]]
        ]);
        let outcome = evaluate(&rules, &json!({"email": ""})).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error_ast.len(), 1);

        let outcome = evaluate(&rules, &json!({"email": "a@b.com"})).unwrap();
        assert!(outcome.success);
        assert!(outcome.error_ast.is_empty());
    }

    #[test]
    fn evaluate_rejects_unknown_predicates() {
        let rules = json!([["val", ["email", ["predicate", ["email?", []]]]]]);
        assert!(matches!(
            evaluate(&rules, &json!({})),
            Err(EvalError::UnknownPredicate { .. })
        ));
    }
}
