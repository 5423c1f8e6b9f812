//! Core evaluator types: configuration errors and the evaluation subject.

use serde_json::Value;
use sieve_interchange::InterchangeError;

/// Configuration and programming errors raised while compiling or
/// evaluating rules.
///
/// Validation failures are never reported through this type; they are
/// data carried on [`crate::RuleResult`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// A predicate id has no registry entry.
    #[error("unknown predicate '{id}'")]
    UnknownPredicate { id: String },
    /// A predicate was called with the wrong number of arguments.
    #[error("predicate '{id}' expects {expected} argument(s), got {got}")]
    Arity {
        id: String,
        expected: usize,
        got: usize,
    },
    /// An AST argument name does not match the registered definition.
    #[error("predicate '{id}' argument {position} is '{expected}', got '{got}'")]
    ArgumentName {
        id: String,
        position: usize,
        expected: String,
        got: String,
    },
    /// A well-formed AST that cannot be compiled in its context.
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },
    /// A rule was applied to a value of the wrong shape.
    #[error("type error: {message}")]
    TypeError { message: String },
    /// The AST document itself could not be read.
    #[error(transparent)]
    Interchange(#[from] InterchangeError),
}

/// The value a rule node is applied to.
///
/// `Wrapped` models an optional box: `Wrapped(None)` is an absent value,
/// `Wrapped(Some(v))` a present one. Every rule unwraps before calling
/// its predicate and an absent box reads as null, so `none?` holds for
/// both `Wrapped(None)` and `Wrapped(Some(null))`.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    Bare(Value),
    Wrapped(Option<Value>),
}

impl Subject {
    /// The underlying value, with an absent box read as null.
    pub fn value(&self) -> Value {
        match self {
            Subject::Bare(v) => v.clone(),
            Subject::Wrapped(Some(v)) => v.clone(),
            Subject::Wrapped(None) => Value::Null,
        }
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self, Subject::Wrapped(_))
    }
}

impl From<Value> for Subject {
    fn from(v: Value) -> Self {
        Subject::Bare(v)
    }
}

impl From<Option<Value>> for Subject {
    fn from(v: Option<Value>) -> Self {
        Subject::Wrapped(v)
    }
}

/// Human-readable JSON type name used in diagnostics.
pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "hash",
    }
}
