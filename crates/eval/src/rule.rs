//! Rule node algebra.
//!
//! A [`Rule`] is an immutable tree built once per schema and evaluated
//! once per input. Combinators (`and`, `or`, `xor`, `then` and their
//! operator forms) return new nodes and never touch their operands.
//!
//! Composite evaluation short-circuits:
//!
//! - `and`: a failing left side is returned as is; otherwise the right
//!   side runs on the left result's input.
//! - `or`: a succeeding left side is returned as is; otherwise the right
//!   side runs on the original input.
//! - `then` (implication): a failing left side yields a vacuous success
//!   without running the right side.
//! - `xor`: both sides always run.

use std::collections::BTreeMap;
use std::ops::{BitAnd, BitOr, BitXor, Shr};

use serde_json::Value;
use sieve_interchange::{Connective, KeyPath, RuleAst};

use crate::predicate::Predicate;
use crate::result::{ResultKind, RuleResult};
use crate::types::{type_name, EvalError, Subject};

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Applies the predicate to the subject itself.
    Value {
        name: Option<String>,
        predicate: Predicate,
    },
    /// Applies the predicate to `(name, subject)`; the result's input is
    /// `subject[name]`.
    Key { name: String, predicate: Predicate },
    /// Applies `rule` to every element of an array subject.
    Each {
        name: Option<String>,
        rule: Box<Rule>,
    },
    /// Applies every child rule to the same subject.
    Set {
        name: Option<String>,
        rules: Vec<Rule>,
    },
    /// Cross-field rule over the inputs of earlier results named `names`.
    Group {
        name: String,
        names: Vec<String>,
        predicate: Predicate,
    },
    /// Cross-field rule over values read from the input at `keys`. Skipped
    /// when an earlier rule named by a path's first key failed.
    Check {
        name: String,
        keys: Vec<KeyPath>,
        predicate: Predicate,
    },
    Composite {
        op: Connective,
        name: String,
        left: Box<Rule>,
        right: Box<Rule>,
    },
}

impl Rule {
    pub fn value(name: Option<&str>, predicate: Predicate) -> Rule {
        Rule::Value {
            name: name.map(str::to_string),
            predicate,
        }
    }

    pub fn key(name: impl Into<String>, predicate: Predicate) -> Rule {
        Rule::Key {
            name: name.into(),
            predicate,
        }
    }

    pub fn each(name: Option<&str>, rule: Rule) -> Rule {
        Rule::Each {
            name: name.map(str::to_string),
            rule: Box::new(rule),
        }
    }

    pub fn set(name: Option<&str>, rules: Vec<Rule>) -> Rule {
        Rule::Set {
            name: name.map(str::to_string),
            rules,
        }
    }

    pub fn group(name: impl Into<String>, names: Vec<String>, predicate: Predicate) -> Rule {
        Rule::Group {
            name: name.into(),
            names,
            predicate,
        }
    }

    pub fn check(name: impl Into<String>, keys: Vec<KeyPath>, predicate: Predicate) -> Rule {
        Rule::Check {
            name: name.into(),
            keys,
            predicate,
        }
    }

    /// Join two rules. The node name is `{left}_{op}_{right}`, with
    /// `value` standing in for anonymous operands.
    pub fn composite(op: Connective, left: Rule, right: Rule) -> Rule {
        let name = format!(
            "{}_{}_{}",
            left.name().unwrap_or("value"),
            op,
            right.name().unwrap_or("value")
        );
        Rule::Composite {
            op,
            name,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(&self, other: &Rule) -> Rule {
        Rule::composite(Connective::And, self.clone(), other.clone())
    }

    pub fn or(&self, other: &Rule) -> Rule {
        Rule::composite(Connective::Or, self.clone(), other.clone())
    }

    pub fn xor(&self, other: &Rule) -> Rule {
        Rule::composite(Connective::Xor, self.clone(), other.clone())
    }

    /// Implication: `other` only matters when `self` succeeds.
    pub fn then(&self, other: &Rule) -> Rule {
        Rule::composite(Connective::Implication, self.clone(), other.clone())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Rule::Value { name, .. } | Rule::Each { name, .. } | Rule::Set { name, .. } => {
                name.as_deref()
            }
            Rule::Key { name, .. }
            | Rule::Group { name, .. }
            | Rule::Check { name, .. }
            | Rule::Composite { name, .. } => Some(name),
        }
    }

    /// The predicate applied directly by this node, if any.
    pub fn predicate(&self) -> Option<&Predicate> {
        match self {
            Rule::Value { predicate, .. }
            | Rule::Key { predicate, .. }
            | Rule::Group { predicate, .. }
            | Rule::Check { predicate, .. } => Some(predicate),
            _ => None,
        }
    }

    /// Evaluation stratum: rules that read earlier results (groups and
    /// checks, at any depth) run after every other rule.
    pub fn stratum(&self) -> u32 {
        match self {
            Rule::Group { .. } | Rule::Check { .. } => 1,
            Rule::Value { .. } | Rule::Key { .. } => 0,
            Rule::Each { rule, .. } => rule.stratum(),
            Rule::Set { rules, .. } => rules.iter().map(Rule::stratum).max().unwrap_or(0),
            Rule::Composite { left, right, .. } => left.stratum().max(right.stratum()),
        }
    }

    pub fn to_ast(&self) -> RuleAst {
        match self {
            Rule::Value { name, predicate } => RuleAst::val(name.as_deref(), predicate.to_ast()),
            Rule::Key { name, predicate } => RuleAst::key(name.clone(), predicate.to_ast()),
            Rule::Each { name, rule } => RuleAst::each(name.as_deref(), rule.to_ast()),
            Rule::Set { name, rules } => {
                RuleAst::set(name.as_deref(), rules.iter().map(Rule::to_ast).collect())
            }
            Rule::Group {
                name,
                names,
                predicate,
            } => RuleAst::Group {
                name: name.clone(),
                names: names.clone(),
                node: Box::new(predicate.to_ast()),
            },
            Rule::Check {
                name,
                keys,
                predicate,
            } => RuleAst::Check {
                name: name.clone(),
                keys: keys.clone(),
                node: Box::new(predicate.to_ast()),
            },
            Rule::Composite {
                op, left, right, ..
            } => RuleAst::composite(*op, left.to_ast(), right.to_ast()),
        }
    }

    /// Evaluate against a plain input with no prior results.
    pub fn call(&self, input: &Value) -> Result<RuleResult<'_>, EvalError> {
        self.eval(&Subject::Bare(input.clone()), &EvalContext::new())
    }

    pub fn eval(&self, subject: &Subject, ctx: &EvalContext) -> Result<RuleResult<'_>, EvalError> {
        match self {
            Rule::Value { predicate, .. } => {
                let input = subject.value();
                let success = predicate.call(&input)?;
                Ok(RuleResult::new(input, success, self, ResultKind::Value))
            }

            Rule::Key { name, predicate } => {
                let input = subject.value();
                let success = predicate.call_with(&[Value::String(name.clone()), input.clone()])?;
                let extracted = input.get(name).cloned().unwrap_or(Value::Null);
                Ok(RuleResult::new(extracted, success, self, ResultKind::Value))
            }

            Rule::Each { name, rule } => {
                let input = subject.value();
                let Value::Array(items) = &input else {
                    return Err(EvalError::TypeError {
                        message: format!(
                            "each rule '{}' expects an array, got {}",
                            name.as_deref().unwrap_or("value"),
                            type_name(&input)
                        ),
                    });
                };
                let children = items
                    .iter()
                    .map(|item| rule.eval(&Subject::Bare(item.clone()), ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                let success = children.iter().all(|c| c.success);
                Ok(RuleResult::new(input, success, self, ResultKind::Each(children)))
            }

            Rule::Set { rules, .. } => {
                let children = rules
                    .iter()
                    .map(|rule| rule.eval(subject, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                let success = children.iter().all(|c| c.success);
                Ok(RuleResult::new(
                    subject.value(),
                    success,
                    self,
                    ResultKind::Set(children),
                ))
            }

            Rule::Group {
                name,
                names,
                predicate,
            } => {
                let mut values = Vec::with_capacity(names.len());
                for dep in names {
                    match ctx.get(dep) {
                        Some(binding) if binding.success => values.push(binding.input.clone()),
                        _ => {
                            tracing::trace!(group = %name, missing = %dep, "group skipped");
                            return Ok(RuleResult::new(
                                Value::Null,
                                false,
                                self,
                                ResultKind::Skipped,
                            ));
                        }
                    }
                }
                let success = predicate.call_with(&values)?;
                Ok(RuleResult::new(
                    Value::Array(values),
                    success,
                    self,
                    ResultKind::Value,
                ))
            }

            Rule::Check {
                name,
                keys,
                predicate,
            } => {
                let failed_dep = keys
                    .iter()
                    .filter_map(|path| path.first())
                    .find(|dep| ctx.get(dep).is_some_and(|b| !b.success));
                if let Some(dep) = failed_dep {
                    tracing::trace!(check = %name, failed = %dep, "check skipped");
                    return Ok(RuleResult::new(
                        Value::Null,
                        false,
                        self,
                        ResultKind::Skipped,
                    ));
                }
                let input = subject.value();
                let values: Vec<Value> = keys.iter().map(|path| dig(&input, path)).collect();
                let success = predicate.call_with(&values)?;
                Ok(RuleResult::new(
                    Value::Array(values),
                    success,
                    self,
                    ResultKind::Value,
                ))
            }

            Rule::Composite {
                op, left, right, ..
            } => {
                let first = left.eval(subject, ctx)?;
                match op {
                    Connective::And => first.and(right, ctx),
                    Connective::Or => first.or(right, subject, ctx),
                    Connective::Implication => first.implies(right, ctx),
                    Connective::Xor => {
                        let second = right.eval(subject, ctx)?;
                        Ok(first.xor(second, self))
                    }
                }
            }
        }
    }
}

/// The value at `path`, or null when any key along it is absent.
fn dig(input: &Value, path: &[String]) -> Value {
    path.iter()
        .try_fold(input, |v, key| v.get(key.as_str()))
        .cloned()
        .unwrap_or(Value::Null)
}

impl BitAnd for Rule {
    type Output = Rule;

    fn bitand(self, rhs: Rule) -> Rule {
        Rule::composite(Connective::And, self, rhs)
    }
}

impl BitOr for Rule {
    type Output = Rule;

    fn bitor(self, rhs: Rule) -> Rule {
        Rule::composite(Connective::Or, self, rhs)
    }
}

impl BitXor for Rule {
    type Output = Rule;

    fn bitxor(self, rhs: Rule) -> Rule {
        Rule::composite(Connective::Xor, self, rhs)
    }
}

impl Shr for Rule {
    type Output = Rule;

    fn shr(self, rhs: Rule) -> Rule {
        Rule::composite(Connective::Implication, self, rhs)
    }
}

// ──────────────────────────────────────────────
// Evaluation context
// ──────────────────────────────────────────────

/// Outcome of an earlier rule, as seen by group and check rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub success: bool,
    pub input: Value,
}

/// Results of earlier rules, keyed by rule name.
#[derive(Debug, Clone)]
pub struct EvalContext {
    pub bindings: BTreeMap<String, Binding>,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext {
    pub fn new() -> Self {
        EvalContext {
            bindings: BTreeMap::new(),
        }
    }

    /// Record a result. A name recorded more than once succeeds only if
    /// every recorded result succeeded; the latest input wins.
    pub fn record(&mut self, name: &str, success: bool, input: Value) {
        let binding = self.bindings.entry(name.to_string()).or_insert(Binding {
            success: true,
            input: Value::Null,
        });
        binding.success &= success;
        binding.input = input;
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
