//! Named, curryable boolean predicates.
//!
//! A predicate is a pure function over `(leading args..., subject)`.
//! Currying appends leading arguments and negation flips the outcome;
//! both return new values and leave the original untouched. Arity is
//! checked when the predicate is called, never when it is curried.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use sieve_interchange::{Args, ErrorAst, RuleAst};

use crate::types::EvalError;

/// The function behind a predicate. Receives every argument, the subject last.
pub type PredicateFn = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// Argument name given to the subject in exported ASTs.
pub const INPUT_ARG: &str = "input";

#[derive(Clone)]
pub struct Predicate {
    id: Arc<str>,
    /// Names of the leading arguments, subject excluded.
    arg_names: Arc<[String]>,
    args: Vec<Value>,
    negated: bool,
    func: PredicateFn,
}

impl Predicate {
    pub fn new(id: impl Into<Arc<str>>, arg_names: Arc<[String]>, func: PredicateFn) -> Self {
        Predicate {
            id: id.into(),
            arg_names,
            args: Vec::new(),
            negated: false,
            func,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn arg_names(&self) -> &[String] {
        &self.arg_names
    }

    /// Arguments curried so far.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Total number of arguments, subject included.
    pub fn arity(&self) -> usize {
        self.arg_names.len() + 1
    }

    /// A copy with `args` appended to the curried arguments.
    pub fn curry(&self, args: impl IntoIterator<Item = Value>) -> Predicate {
        let mut curried = self.clone();
        curried.args.extend(args);
        curried
    }

    /// A copy whose outcome is inverted.
    pub fn negation(&self) -> Predicate {
        let mut negated = self.clone();
        negated.negated = !self.negated;
        negated
    }

    /// Call with the curried arguments followed by `rest`.
    pub fn call_with(&self, rest: &[Value]) -> Result<bool, EvalError> {
        let got = self.args.len() + rest.len();
        if got != self.arity() {
            return Err(EvalError::Arity {
                id: self.id.to_string(),
                expected: self.arity(),
                got,
            });
        }
        let outcome = if rest.is_empty() {
            (self.func)(&self.args)
        } else if self.args.is_empty() {
            (self.func)(rest)
        } else {
            let all: Vec<Value> = self.args.iter().chain(rest).cloned().collect();
            (self.func)(&all)
        };
        Ok(outcome != self.negated)
    }

    /// Apply to a single subject.
    pub fn call(&self, subject: &Value) -> Result<bool, EvalError> {
        self.call_with(std::slice::from_ref(subject))
    }

    /// Rule AST for this predicate with its curried arguments. Values past
    /// the declared leading arguments are named `input`.
    pub fn to_ast(&self) -> RuleAst {
        let node = RuleAst::predicate(self.id.to_string(), self.named(self.args.iter()));
        if self.negated {
            RuleAst::negated(node)
        } else {
            node
        }
    }

    /// Error AST for a failed application, naming every argument.
    pub fn applied_ast(&self, applied: &[Value]) -> ErrorAst {
        let node = ErrorAst::Predicate {
            id: self.id.to_string(),
            args: self.named(self.args.iter().chain(applied)),
        };
        if self.negated {
            ErrorAst::Not(Box::new(node))
        } else {
            node
        }
    }

    /// Pair values with argument names by position.
    fn named<'a>(&self, values: impl Iterator<Item = &'a Value>) -> Args {
        values
            .enumerate()
            .map(|(i, v)| {
                let name = self
                    .arg_names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| INPUT_ARG.to_string());
                (name, v.clone())
            })
            .collect()
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("id", &self.id)
            .field("args", &self.args)
            .field("negated", &self.negated)
            .finish()
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.args == other.args && self.negated == other.negated
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
