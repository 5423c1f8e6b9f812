//! Error AST to messages.
//!
//! The compiler walks the failure tree carrying a small context: the path
//! so far, the nearest named rule, the value under test and whether the
//! subtree is negated. Every predicate leaf becomes one [`Message`].

use serde_json::Value;
use sieve_interchange::{Args, ErrorAst};

use crate::error::MessageError;
use crate::lookup::MessageResolver;
use crate::message::{Message, MessageKind, MessageSet, PathSegment};
use crate::tokens;

/// Prefix applied to a predicate id when its message is looked up under a
/// negation.
pub const NEGATION_PREFIX: &str = "not_";

#[derive(Debug, Clone, Default)]
pub(crate) struct Visit {
    pub(crate) path: Vec<PathSegment>,
    pub(crate) rule: Option<String>,
    pub(crate) value: Value,
    pub(crate) negated: bool,
}

impl Visit {
    pub(crate) fn named(&self, name: &str, value: &Value) -> Visit {
        let mut path = self.path.clone();
        path.push(PathSegment::Key(name.to_string()));
        Visit {
            path,
            rule: Some(name.to_string()),
            value: value.clone(),
            negated: self.negated,
        }
    }

    pub(crate) fn anonymous(&self, value: &Value) -> Visit {
        Visit {
            value: value.clone(),
            ..self.clone()
        }
    }

    pub(crate) fn element(&self, index: usize) -> Visit {
        let mut path = self.path.clone();
        path.push(PathSegment::Index(index));
        Visit {
            path,
            ..self.clone()
        }
    }

    pub(crate) fn negation(&self) -> Visit {
        Visit {
            negated: !self.negated,
            ..self.clone()
        }
    }
}

pub struct MessageCompiler {
    resolver: MessageResolver,
}

impl MessageCompiler {
    pub fn new(resolver: MessageResolver) -> Self {
        MessageCompiler { resolver }
    }

    pub fn resolver(&self) -> &MessageResolver {
        &self.resolver
    }

    /// Turn a list of error ASTs into messages. A predicate with no
    /// resolvable template fails the whole compilation.
    pub fn compile(&self, asts: &[ErrorAst]) -> Result<MessageSet, MessageError> {
        let mut set = MessageSet::new();
        for ast in asts {
            self.visit(ast, &Visit::default(), &mut set)?;
        }
        tracing::debug!(messages = set.len(), "compiled error messages");
        Ok(set)
    }

    fn visit(&self, ast: &ErrorAst, at: &Visit, out: &mut MessageSet) -> Result<(), MessageError> {
        match ast {
            ErrorAst::Input { name, value, nodes } => {
                let next = match name {
                    Some(name) => at.named(name, value),
                    None => at.anonymous(value),
                };
                for node in nodes {
                    self.visit(node, &next, out)?;
                }
            }
            ErrorAst::Predicate { id, args } => {
                out.push(self.message(id, args, at, MessageKind::Error)?);
            }
            ErrorAst::Not(node) => self.visit(node, &at.negation(), out)?,
            ErrorAst::Set(nodes) | ErrorAst::Each(nodes) => {
                for node in nodes {
                    self.visit(node, at, out)?;
                }
            }
            ErrorAst::El { index, node } => self.visit(node, &at.element(*index), out)?,
            ErrorAst::Check { node, .. } => self.visit(node, at, out)?,
            ErrorAst::Xor(left, right) => {
                self.visit(left, at, out)?;
                self.visit(right, at, out)?;
            }
        }
        Ok(())
    }

    /// Resolve and render one predicate message at the visitor's position.
    pub(crate) fn message(
        &self,
        id: &str,
        args: &Args,
        at: &Visit,
        kind: MessageKind,
    ) -> Result<Message, MessageError> {
        let predicate = if at.negated {
            format!("{NEGATION_PREFIX}{id}")
        } else {
            id.to_string()
        };
        let args: Args = args
            .iter()
            .filter(|(name, _)| name != sieve_eval::predicate::INPUT_ARG)
            .cloned()
            .collect();

        let rule = at.rule.as_deref();
        let arg_type = tokens::arg_type(id, &args);
        let template = self.resolver.template(rule, &predicate, arg_type)?;

        let display = rule.map(|r| self.resolver.display_name(r));
        let table = tokens::build(
            display.as_deref().unwrap_or_default(),
            rule,
            &at.value,
            id,
            &args,
        );
        let mut text = tokens::interpolate(&template.text, &table);
        if self.resolver.config().full {
            if let Some(display) = display {
                text = format!("{display} {text}");
            }
        }

        Ok(Message {
            path: at.path.clone(),
            rule: at.rule.clone(),
            predicate,
            args,
            text,
            meta: template.meta,
            kind,
        })
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::YamlBackend;
    use crate::config::MessagesConfig;
    use serde_json::json;
    use sieve_interchange::error_ast_from_json;
    use std::sync::Arc;

    fn compiler(config: MessagesConfig) -> MessageCompiler {
        let backend = YamlBackend::builtin().unwrap();
        MessageCompiler::new(MessageResolver::new(Arc::new(backend), config))
    }

    fn compile(ast: serde_json::Value) -> MessageSet {
        let ast = error_ast_from_json(&ast).unwrap();
        compiler(MessagesConfig::default()).compile(&[ast]).unwrap()
    }

    #[test]
    fn named_inputs_extend_the_path() {
        let set = compile(json!(
            ["input", ["age", 18, [["predicate", ["gt?", [["num", 18], ["input", 18]]]]]]]
        ));
        assert_eq!(set.to_json(), json!({"age": ["must be greater than 18"]}));
        let message = set.iter().next().unwrap();
        assert_eq!(message.args, vec![("num".to_string(), json!(18))]);
        assert_eq!(message.rule.as_deref(), Some("age"));
    }

    #[test]
    fn negation_uses_prefixed_template() {
        let set = compile(json!(
            ["input", ["tags", [], [["not", ["predicate", ["empty?", [["input", []]]]]]]]]
        ));
        assert_eq!(set.to_json(), json!({"tags": ["must not be empty"]}));
        assert_eq!(set.iter().next().unwrap().predicate, "not_empty?");
    }

    #[test]
    fn each_elements_are_indexed() {
        let set = compile(json!(
            ["input", ["tags", ["a", ""], [["each", [
                ["el", [1, ["input", [null, "", [["predicate", ["filled?", [["input", ""]]]]]]]]]
            ]]]]]
        ));
        assert_eq!(set.to_json(), json!({"tags": {"1": ["must be filled"]}}));
    }

    #[test]
    fn ranged_size_uses_range_template() {
        let set = compile(json!(
            ["input", ["code", "a", [["predicate", ["size?", [["size", {"min": 2, "max": 4}], ["input", "a"]]]]]]]
        ));
        assert_eq!(set.to_json(), json!({"code": ["size must be within 2 - 4"]}));
    }

    #[test]
    fn full_mode_prefixes_display_name() {
        let yaml = "en:\n  errors:\n    filled?: must be filled\n  rules:\n    email: Email\n";
        let backend = YamlBackend::parse(yaml, "en").unwrap();
        let config = MessagesConfig {
            full: true,
            ..MessagesConfig::default()
        };
        let compiler = MessageCompiler::new(MessageResolver::new(Arc::new(backend), config));
        let ast = error_ast_from_json(&json!(
            ["input", ["email", "", [["predicate", ["filled?", [["input", ""]]]]]]]
        ))
        .unwrap();
        let set = compiler.compile(&[ast]).unwrap();
        assert_eq!(set.to_json(), json!({"email": ["Email must be filled"]}));
    }

    #[test]
    fn missing_template_fails_compilation() {
        let ast = error_ast_from_json(&json!(
            ["input", ["age", 1, [["predicate", ["adult?", [["input", 1]]]]]]]
        ))
        .unwrap();
        let err = compiler(MessagesConfig::default()).compile(&[ast]).unwrap_err();
        assert!(matches!(err, MessageError::MissingMessage { ref predicate, .. } if predicate == "adult?"));
    }
}
