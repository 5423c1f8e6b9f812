//! Stratified schema evaluation.
//!
//! Rules run in two strata. Stratum 0 holds every rule that only reads
//! the input; those rules are independent and run in declaration order.
//! Stratum 1 holds rules containing groups or checks, which read the
//! stratum-0 results through an [`EvalContext`].

use serde_json::Value;
use sieve_interchange::{rules_from_json, ErrorAst, RuleAst};

use crate::compiler::RuleCompiler;
use crate::registry::PredicateRegistry;
use crate::result::RuleResult;
use crate::rule::{EvalContext, Rule};
use crate::types::{EvalError, Subject};

const MAX_STRATUM: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    rules: Vec<Rule>,
}

impl Schema {
    pub fn new(rules: Vec<Rule>) -> Self {
        Schema { rules }
    }

    pub fn compile(asts: &[RuleAst], registry: &PredicateRegistry) -> Result<Self, EvalError> {
        Ok(Schema::new(RuleCompiler::new(registry).compile(asts)?))
    }

    /// Compile from a JSON list of rule nodes.
    pub fn from_json(v: &Value, registry: &PredicateRegistry) -> Result<Self, EvalError> {
        Schema::compile(&rules_from_json(v)?, registry)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn to_ast(&self) -> Vec<RuleAst> {
        self.rules.iter().map(Rule::to_ast).collect()
    }

    pub fn call(&self, input: &Value) -> Result<SchemaResult<'_>, EvalError> {
        let mut ctx = EvalContext::new();
        let mut results = Vec::with_capacity(self.rules.len());

        for stratum in 0..=MAX_STRATUM {
            for rule in self.rules.iter().filter(|r| r.stratum() == stratum) {
                let result = rule.eval(&Subject::Bare(input.clone()), &ctx)?;
                if stratum == 0 {
                    if let Some(name) = result.rule.name() {
                        ctx.record(name, result.success, result.input.clone());
                    }
                }
                results.push(result);
            }
        }

        let failed = results.iter().filter(|r| !r.success).count();
        tracing::debug!(rules = results.len(), failed, "schema evaluated");
        Ok(SchemaResult { results })
    }
}

/// Results of one schema evaluation, in evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaResult<'s> {
    results: Vec<RuleResult<'s>>,
}

impl<'s> SchemaResult<'s> {
    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    pub fn results(&self) -> &[RuleResult<'s>] {
        &self.results
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleResult<'s>> {
        self.results.iter().filter(|r| r.is_reportable())
    }

    /// Error AST of every reported failure.
    pub fn error_ast(&self) -> Vec<ErrorAst> {
        self.failures().map(RuleResult::to_ast).collect()
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
