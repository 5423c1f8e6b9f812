//! Static hints derived from rule ASTs.
//!
//! A hint is a message for a constraint that may not have run because an
//! earlier check short-circuited, e.g. `gt?(18)` in
//! `none? | (int? & gt?(18))` when `age` is null. Hints are computed from
//! the rule tree alone, never from an evaluated result.
//!
//! Traversal: both operands of `and`, `or` and `xor`; only the consequent
//! of `implication`; every child of `set` and `each`. Presence and type
//! predicates never produce hints. Group and check rules are skipped: their
//! predicate arguments only exist once earlier results are known.

use serde_json::Value;
use sieve_eval::builtins::TYPE_PREDICATES;
use sieve_interchange::{Connective, RuleAst};

use crate::compiler::{MessageCompiler, Visit};
use crate::error::MessageError;
use crate::message::{MessageKind, MessageSet};

const PRESENCE_PREDICATES: &[&str] = &["key?", "filled?"];

/// Whether a predicate id can ever yield a hint.
pub fn is_hintable(id: &str) -> bool {
    !PRESENCE_PREDICATES.contains(&id) && !TYPE_PREDICATES.contains(&id)
}

pub struct HintCompiler<'a> {
    compiler: &'a MessageCompiler,
}

impl<'a> HintCompiler<'a> {
    pub fn new(compiler: &'a MessageCompiler) -> Self {
        HintCompiler { compiler }
    }

    /// Hints for a list of top-level rule ASTs, keyed by path like errors.
    pub fn compile(&self, asts: &[RuleAst]) -> Result<MessageSet, MessageError> {
        let mut set = MessageSet::new();
        for ast in asts {
            self.visit(ast, &Visit::default(), &mut set)?;
        }
        tracing::debug!(hints = set.len(), "compiled hints");
        Ok(set)
    }

    fn visit(&self, ast: &RuleAst, at: &Visit, out: &mut MessageSet) -> Result<(), MessageError> {
        match ast {
            RuleAst::Predicate { id, args } => {
                if is_hintable(id) {
                    out.push(self.compiler.message(id, args, at, MessageKind::Hint)?);
                }
            }
            RuleAst::Not(node) => self.visit(node, &at.negation(), out)?,
            RuleAst::Val { name, node } | RuleAst::Each { name, node } => {
                self.visit(node, &scoped(at, name.as_deref()), out)?
            }
            RuleAst::Key { name, node } => {
                self.visit(node, &scoped(at, Some(name.as_str())), out)?
            }
            RuleAst::Group { .. } | RuleAst::Check { .. } => {}
            RuleAst::Set { name, nodes } => {
                let inner = scoped(at, name.as_deref());
                for node in nodes {
                    self.visit(node, &inner, out)?;
                }
            }
            RuleAst::Composite { op, left, right } => {
                if *op != Connective::Implication {
                    self.visit(left, at, out)?;
                }
                self.visit(right, at, out)?;
            }
        }
        Ok(())
    }
}

/// Enter a named rule. A name equal to the current rule keeps the path,
/// so `val("age", ...)` inside `set("age", ...)` is one segment deep.
fn scoped(at: &Visit, name: Option<&str>) -> Visit {
    match name {
        Some(name) if at.rule.as_deref() != Some(name) => at.named(name, &Value::Null),
        _ => at.anonymous(&Value::Null),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
