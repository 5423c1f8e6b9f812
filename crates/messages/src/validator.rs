//! Schema plus messages: the full validation pipeline.
//!
//! [`Validator`] evaluates a compiled [`Schema`], exports the failures as
//! error ASTs and renders them. Consumers pick what they need from the
//! outcome through [`MessageOutcome`]: errors only, hints only, or both.

use std::sync::Arc;

use serde_json::Value;
use sieve_eval::{PredicateRegistry, Schema};
use sieve_interchange::ErrorAst;

use crate::backend::YamlBackend;
use crate::compiler::MessageCompiler;
use crate::config::MessagesConfig;
use crate::error::{MessageError, ValidatorError};
use crate::hints::HintCompiler;
use crate::lookup::MessageResolver;
use crate::message::MessageSet;

/// Message views over a validation outcome.
pub trait MessageOutcome {
    fn errors(&self) -> &MessageSet;

    fn hints(&self) -> &MessageSet;

    /// Errors followed by the hints for paths that have errors. A hint is
    /// dropped when the same predicate already failed at that path.
    fn messages(&self) -> MessageSet {
        let errors = self.errors();
        let mut all = errors.clone();
        for hint in self.hints() {
            let failing: Vec<_> = errors.at(&hint.path).collect();
            if failing.is_empty() {
                continue;
            }
            if failing.iter().any(|e| e.predicate == hint.predicate) {
                continue;
            }
            all.push(hint.clone());
        }
        all
    }
}

/// Owned result of one validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub success: bool,
    pub error_ast: Vec<ErrorAst>,
    errors: MessageSet,
    hints: MessageSet,
}

impl Validation {
    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl MessageOutcome for Validation {
    fn errors(&self) -> &MessageSet {
        &self.errors
    }

    fn hints(&self) -> &MessageSet {
        &self.hints
    }
}

pub struct Validator {
    schema: Schema,
    compiler: MessageCompiler,
    hints: MessageSet,
}

impl Validator {
    /// Hints are derived once here from the schema's rule ASTs.
    pub fn new(schema: Schema, compiler: MessageCompiler) -> Result<Self, MessageError> {
        let hints = HintCompiler::new(&compiler).compile(&schema.to_ast())?;
        Ok(Validator {
            schema,
            compiler,
            hints,
        })
    }

    /// Compile a JSON rule document against `registry` and render with
    /// `backend`.
    pub fn from_json(
        rules: &Value,
        registry: &PredicateRegistry,
        backend: YamlBackend,
        config: MessagesConfig,
    ) -> Result<Self, ValidatorError> {
        let schema = Schema::from_json(rules, registry)?;
        let resolver = MessageResolver::new(Arc::new(backend), config);
        Ok(Validator::new(schema, MessageCompiler::new(resolver))?)
    }

    /// Built-in predicates, bundled English templates, default settings.
    pub fn with_defaults(rules: &Value) -> Result<Self, ValidatorError> {
        Validator::from_json(
            rules,
            &PredicateRegistry::default(),
            YamlBackend::builtin()?,
            MessagesConfig::default(),
        )
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn hints(&self) -> &MessageSet {
        &self.hints
    }

    pub fn validate(&self, input: &Value) -> Result<Validation, ValidatorError> {
        let result = self.schema.call(input)?;
        let error_ast = result.error_ast();
        let errors = self.compiler.compile(&error_ast)?;
        tracing::debug!(
            success = result.success(),
            errors = errors.len(),
            "validated input"
        );
        Ok(Validation {
            success: result.success(),
            error_ast,
            errors,
            hints: self.hints.clone(),
        })
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn age_rules() -> Value {
        json!([
            ["and", [
                ["key", ["age", ["predicate", ["key?", []]]]],
                ["val", ["age", ["or", [
                    ["predicate", ["none?", []]],
                    ["and", [
                        ["predicate", ["int?", []]],
                        ["predicate", ["gt?", [["num", 18]]]]
                    ]]
                ]]]]
            ]]
        ])
    }

    #[test]
    fn hints_survive_a_successful_validation() {
        let validator = Validator::with_defaults(&age_rules()).unwrap();
        let validation = validator.validate(&json!({"age": null})).unwrap();
        assert!(validation.is_success());
        assert!(validation.errors().is_empty());
        assert_eq!(
            validation.hints().to_json(),
            json!({"age": ["must be greater than 18"]})
        );
        assert!(validation.messages().is_empty());
    }

    #[test]
    fn messages_add_hints_for_failing_paths() {
        let validator = Validator::with_defaults(&age_rules()).unwrap();
        let validation = validator.validate(&json!({"age": "old"})).unwrap();
        assert!(!validation.success);
        assert_eq!(
            validation.errors().to_json(),
            json!({"age": ["must be an integer"]})
        );
        assert_eq!(
            validation.messages().to_json(),
            json!({"age": ["must be an integer", "must be greater than 18"]})
        );
    }

    #[test]
    fn duplicate_hint_is_not_repeated() {
        let validator = Validator::with_defaults(&age_rules()).unwrap();
        let validation = validator.validate(&json!({"age": 10})).unwrap();
        assert_eq!(
            validation.messages().to_json(),
            json!({"age": ["must be greater than 18"]})
        );
    }

    #[test]
    fn group_predicates_never_leak_into_messages() {
        let rules = json!([
            ["group", ["confirmation", ["password", "confirmation"],
                ["predicate", ["eql?", []]]]],
            ["and", [
                ["key", ["password", ["predicate", ["key?", []]]]],
                ["val", ["password", ["predicate", ["filled?", []]]]]
            ]],
            ["and", [
                ["key", ["confirmation", ["predicate", ["key?", []]]]],
                ["val", ["confirmation", ["predicate", ["filled?", []]]]]
            ]]
        ]);
        let validator = Validator::with_defaults(&rules).unwrap();
        assert!(validator.hints().is_empty());

        let validation = validator
            .validate(&json!({"password": "a", "confirmation": ""}))
            .unwrap();
        assert_eq!(
            validation.messages().to_json(),
            json!({"confirmation": ["must be filled"]})
        );
    }

    #[test]
    fn check_messages_depend_on_the_input() {
        let rules = json!([
            ["check", ["shipping", [["address", "country"]],
                ["predicate", ["included_in?", [["list", ["PL", "DE"]]]]]]]
        ]);
        let validator = Validator::with_defaults(&rules).unwrap();

        let validation = validator
            .validate(&json!({"address": {"country": "PL"}}))
            .unwrap();
        assert!(validation.is_success());

        let validation = validator
            .validate(&json!({"address": {"country": "US"}}))
            .unwrap();
        assert_eq!(
            validation.errors().to_json(),
            json!({"shipping": ["must be one of: PL, DE"]})
        );
    }

    #[test]
    fn configuration_errors_surface() {
        let rules = json!([["val", ["age", ["predicate", ["adult?", []]]]]]);
        assert!(matches!(
            Validator::with_defaults(&rules),
            Err(ValidatorError::Eval(_))
        ));
    }
}
