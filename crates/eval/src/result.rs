//! Evaluation results and their export to the error AST.
//!
//! A result borrows the rule that produced it and owns the input it
//! examined. Results are built fresh for every evaluation and never
//! mutated afterwards; `negated` and `curry` return new results.

use serde_json::Value;
use sieve_interchange::ErrorAst;

use crate::rule::{EvalContext, Rule};
use crate::types::{EvalError, Subject};

#[derive(Debug, Clone, PartialEq)]
pub enum ResultKind<'r> {
    /// A single predicate application.
    Value,
    /// One child per rule of a set.
    Set(Vec<RuleResult<'r>>),
    /// One child per element, in element order.
    Each(Vec<RuleResult<'r>>),
    /// Both operands of an exclusive disjunction.
    Xor(Box<RuleResult<'r>>, Box<RuleResult<'r>>),
    /// Success narrowed to results produced by one predicate id.
    Verified {
        result: Box<RuleResult<'r>>,
        predicate_id: String,
    },
    /// A group whose dependencies were missing or failed. The predicate
    /// was not called and nothing is reported.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleResult<'r> {
    pub input: Value,
    pub success: bool,
    pub rule: &'r Rule,
    pub kind: ResultKind<'r>,
    negated: bool,
}

impl<'r> RuleResult<'r> {
    pub fn new(input: Value, success: bool, rule: &'r Rule, kind: ResultKind<'r>) -> Self {
        RuleResult {
            input,
            success,
            rule,
            kind,
            negated: false,
        }
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Conjunction: on failure return `self`, otherwise evaluate `right`
    /// against this result's input.
    pub fn and(self, right: &'r Rule, ctx: &EvalContext) -> Result<RuleResult<'r>, EvalError> {
        if !self.success {
            return Ok(self);
        }
        right.eval(&Subject::Bare(self.input), ctx)
    }

    /// Disjunction: on success return `self`, otherwise evaluate `right`
    /// against the original subject.
    pub fn or(
        self,
        right: &'r Rule,
        subject: &Subject,
        ctx: &EvalContext,
    ) -> Result<RuleResult<'r>, EvalError> {
        if self.success {
            return Ok(self);
        }
        right.eval(subject, ctx)
    }

    /// Implication: a failure here makes the whole implication succeed
    /// without evaluating `right`.
    pub fn implies(
        self,
        right: &'r Rule,
        ctx: &EvalContext,
    ) -> Result<RuleResult<'r>, EvalError> {
        if !self.success {
            return Ok(RuleResult::new(self.input, true, right, ResultKind::Value));
        }
        right.eval(&Subject::Bare(self.input), ctx)
    }

    /// Exclusive disjunction of two evaluated operands under `rule`.
    pub fn xor(self, other: RuleResult<'r>, rule: &'r Rule) -> RuleResult<'r> {
        let success = self.success ^ other.success;
        RuleResult::new(
            self.input.clone(),
            success,
            rule,
            ResultKind::Xor(Box::new(self), Box::new(other)),
        )
    }

    pub fn negated(&self) -> RuleResult<'r> {
        let mut flipped = self.clone();
        flipped.success = !self.success;
        flipped.negated = !self.negated;
        flipped
    }

    /// Wrap as a verified result: successful only when this result
    /// succeeded and was produced by the predicate `predicate_id`.
    pub fn curry(&self, predicate_id: &str) -> RuleResult<'r> {
        let matches = self
            .rule
            .predicate()
            .is_some_and(|p| p.id() == predicate_id);
        RuleResult::new(
            self.input.clone(),
            self.success && matches,
            self.rule,
            ResultKind::Verified {
                result: Box::new(self.clone()),
                predicate_id: predicate_id.to_string(),
            },
        )
    }

    /// Failed results that should appear in error output. Skipped groups
    /// are failures but never reported.
    pub fn is_reportable(&self) -> bool {
        !self.success && !matches!(self.kind, ResultKind::Skipped)
    }

    /// Reportable children of a set or each result, with their positions.
    pub fn failed_children(&self) -> impl Iterator<Item = (usize, &RuleResult<'r>)> {
        let children: &[RuleResult<'r>] = match &self.kind {
            ResultKind::Set(children) | ResultKind::Each(children) => children,
            _ => &[],
        };
        children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_reportable())
    }

    /// Export to the error AST. Only failing children of aggregates are
    /// included.
    pub fn to_ast(&self) -> ErrorAst {
        self.ast_within(None)
    }

    /// A node named like its enclosing node stays on the enclosing path.
    fn ast_within(&self, scope: Option<&str>) -> ErrorAst {
        let own = self.rule.name();
        let inner_scope = own.or(scope);

        let node = match &self.kind {
            ResultKind::Verified { result, .. } => return result.ast_within(scope),
            ResultKind::Xor(left, right) => {
                // Both sides held, so each is reported as its negation.
                let (left, right) = if left.success && right.success {
                    (left.negated(), right.negated())
                } else {
                    ((**left).clone(), (**right).clone())
                };
                return self.negate_if(ErrorAst::Xor(
                    Box::new(left.ast_within(scope)),
                    Box::new(right.ast_within(scope)),
                ));
            }
            ResultKind::Value => self.leaf_ast(),
            ResultKind::Set(_) => ErrorAst::Set(
                self.failed_children()
                    .map(|(_, c)| c.ast_within(inner_scope))
                    .collect(),
            ),
            ResultKind::Each(_) => ErrorAst::Each(
                self.failed_children()
                    .map(|(index, c)| ErrorAst::El {
                        index,
                        node: Box::new(c.ast_within(inner_scope)),
                    })
                    .collect(),
            ),
            ResultKind::Skipped => ErrorAst::Set(Vec::new()),
        };

        let name = match (own, scope) {
            (Some(own), Some(scope)) if own == scope => None,
            (own, _) => own.map(str::to_string),
        };
        let input = ErrorAst::Input {
            name,
            value: self.input.clone(),
            nodes: vec![self.negate_if(node)],
        };
        match self.rule {
            Rule::Check { name, .. } => ErrorAst::Check {
                name: name.clone(),
                node: Box::new(input),
            },
            _ => input,
        }
    }

    fn leaf_ast(&self) -> ErrorAst {
        let Some(predicate) = self.rule.predicate() else {
            return ErrorAst::Set(Vec::new());
        };
        let applied = match self.rule {
            Rule::Key { name, .. } => vec![Value::String(name.clone()), self.input.clone()],
            Rule::Group { .. } | Rule::Check { .. } => match &self.input {
                Value::Array(values) => values.clone(),
                other => vec![other.clone()],
            },
            _ => vec![self.input.clone()],
        };
        predicate.applied_ast(&applied)
    }

    fn negate_if(&self, node: ErrorAst) -> ErrorAst {
        if self.negated {
            ErrorAst::Not(Box::new(node))
        } else {
            node
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Predicate;
    use crate::registry::PredicateRegistry;
    use serde_json::json;

    fn pred(id: &str, args: Vec<Value>) -> Predicate {
        PredicateRegistry::default().resolve(id).unwrap().curry(args)
    }

    fn input(name: Option<&str>, value: Value, nodes: Vec<ErrorAst>) -> ErrorAst {
        ErrorAst::Input {
            name: name.map(str::to_string),
            value,
            nodes,
        }
    }

    fn leaf(id: &str, args: Vec<(&str, Value)>) -> ErrorAst {
        ErrorAst::Predicate {
            id: id.to_string(),
            args: args.into_iter().map(|(n, v)| (n.to_string(), v)).collect(),
        }
    }

    #[test]
    fn value_failure_exports_input_and_predicate() {
        let rule = Rule::value(Some("age"), pred("gt?", vec![json!(18)]));
        let result = rule.call(&json!(18)).unwrap();
        assert_eq!(
            result.to_ast(),
            input(
                Some("age"),
                json!(18),
                vec![leaf("gt?", vec![("num", json!(18)), ("input", json!(18))])]
            )
        );
    }

    #[test]
    fn key_failure_exports_missing_value() {
        let rule = Rule::key("street", pred("key?", vec![]));
        let result = rule.call(&json!({"city": "NYC"})).unwrap();
        assert_eq!(
            result.to_ast(),
            input(
                Some("street"),
                Value::Null,
                vec![leaf("key?", vec![("name", json!("street")), ("input", Value::Null)])]
            )
        );
    }

    #[test]
    fn set_exports_only_failing_children() {
        let rule = Rule::set(
            Some("address"),
            vec![
                Rule::key("city", pred("key?", vec![])),
                Rule::key("street", pred("key?", vec![])),
            ],
        );
        let value = json!({"city": "NYC"});
        let ErrorAst::Input { name, nodes, .. } = rule.call(&value).unwrap().to_ast() else {
            panic!("expected input node");
        };
        assert_eq!(name.as_deref(), Some("address"));
        let ErrorAst::Set(children) = &nodes[0] else {
            panic!("expected set node");
        };
        assert_eq!(children.len(), 1);
        assert!(matches!(&children[0], ErrorAst::Input { name: Some(n), .. } if n == "street"));
    }

    #[test]
    fn children_sharing_the_set_name_are_anonymous() {
        let rule = Rule::set(
            Some("code"),
            vec![
                Rule::value(Some("code"), pred("str?", vec![])),
                Rule::value(Some("code"), pred("size?", vec![json!(3)])),
            ],
        );
        let ast = rule.call(&json!("ab")).unwrap().to_ast();
        assert_eq!(
            ast,
            input(
                Some("code"),
                json!("ab"),
                vec![ErrorAst::Set(vec![input(
                    None,
                    json!("ab"),
                    vec![leaf("size?", vec![("size", json!(3)), ("input", json!("ab"))])]
                )])]
            )
        );
    }

    #[test]
    fn each_exports_indexed_elements() {
        let rule = Rule::each(Some("tags"), Rule::value(None, pred("filled?", vec![])));
        let ast = rule.call(&json!(["ok", "", "ok"])).unwrap().to_ast();
        assert_eq!(
            ast,
            input(
                Some("tags"),
                json!(["ok", "", "ok"]),
                vec![ErrorAst::Each(vec![ErrorAst::El {
                    index: 1,
                    node: Box::new(input(
                        None,
                        json!(""),
                        vec![leaf("filled?", vec![("input", json!(""))])]
                    )),
                }])]
            )
        );
    }

    #[test]
    fn verified_requires_matching_predicate() {
        let rule = Rule::value(Some("age"), pred("int?", vec![]));
        let result = rule.call(&json!(3)).unwrap();
        assert!(result.curry("int?").success);
        assert!(!result.curry("str?").success);
        assert_eq!(result.curry("str?").to_ast(), result.to_ast());
    }

    #[test]
    fn negated_result_flips_success_and_exports_not() {
        let rule = Rule::value(Some("age"), pred("int?", vec![]));
        let result = rule.call(&json!(3)).unwrap().negated();
        assert!(!result.success);
        assert_eq!(
            result.to_ast(),
            input(
                Some("age"),
                json!(3),
                vec![ErrorAst::Not(Box::new(leaf("int?", vec![("input", json!(3))])))]
            )
        );
        assert!(result.negated().success);
    }

    #[test]
    fn check_wraps_its_input() {
        let rule = Rule::check("terms", vec![vec!["terms".to_string()]], pred("true?", vec![]));
        let ast = rule.call(&json!({"terms": false})).unwrap().to_ast();
        let ErrorAst::Check { name, node } = ast else {
            panic!("expected check node");
        };
        assert_eq!(name, "terms");
        assert_eq!(
            *node,
            input(
                Some("terms"),
                json!([false]),
                vec![leaf("true?", vec![("input", json!(false))])]
            )
        );
    }

    fn contact() -> Rule {
        Rule::key("email", pred("key?", vec![])) ^ Rule::key("phone", pred("key?", vec![]))
    }

    #[test]
    fn xor_with_both_sides_failing_reports_both() {
        let binding = contact();
        let result = binding.call(&json!({"name": "Jane"})).unwrap();
        assert!(!result.success);
        assert_eq!(
            result.to_ast(),
            ErrorAst::Xor(
                Box::new(input(
                    Some("email"),
                    Value::Null,
                    vec![leaf("key?", vec![("name", json!("email")), ("input", Value::Null)])]
                )),
                Box::new(input(
                    Some("phone"),
                    Value::Null,
                    vec![leaf("key?", vec![("name", json!("phone")), ("input", Value::Null)])]
                )),
            )
        );
    }

    #[test]
    fn xor_with_both_sides_holding_reports_negations() {
        let binding = contact();
        let result = binding
            .call(&json!({"email": "a@b.c", "phone": "123"}))
            .unwrap();
        assert!(!result.success);
        let ErrorAst::Xor(left, right) = result.to_ast() else {
            panic!("expected xor node");
        };
        assert_eq!(
            *left,
            input(
                Some("email"),
                json!("a@b.c"),
                vec![ErrorAst::Not(Box::new(leaf(
                    "key?",
                    vec![("name", json!("email")), ("input", json!("a@b.c"))]
                )))]
            )
        );
        assert!(matches!(
            *right,
            ErrorAst::Input { ref nodes, .. } if matches!(nodes[0], ErrorAst::Not(_))
        ));
    }
}
