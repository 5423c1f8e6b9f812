//! Template lookup protocol and cache.
//!
//! Candidate keys are tried most specific first:
//!
//! 1. `{root}.{rule}.{predicate}.{arg_type}`
//! 2. `{root}.{rule}.{predicate}`
//! 3. `{root}.{predicate}.{arg_type}`
//! 4. `{root}.{predicate}`
//!
//! Resolved templates are memoized per `(locale, root, rule, predicate,
//! arg_type)` for the resolver's lifetime; `reload` clears the cache.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;

use crate::backend::{MessageBackend, Template};
use crate::config::MessagesConfig;
use crate::error::MessageError;

pub struct MessageResolver {
    backend: Arc<dyn MessageBackend>,
    config: MessagesConfig,
    cache: DashMap<u64, Option<Template>>,
}

impl MessageResolver {
    pub fn new(backend: Arc<dyn MessageBackend>, config: MessagesConfig) -> Self {
        MessageResolver {
            backend,
            config,
            cache: DashMap::new(),
        }
    }

    pub fn config(&self) -> &MessagesConfig {
        &self.config
    }

    /// The locale messages are rendered in.
    pub fn locale(&self) -> &str {
        self.config
            .locale
            .as_deref()
            .unwrap_or_else(|| self.backend.default_locale())
    }

    /// Lookup keys for a predicate, most specific first. Without a rule
    /// only the root-level keys apply.
    pub fn candidates(&self, rule: Option<&str>, predicate: &str, arg_type: &str) -> Vec<String> {
        let root = &self.config.root;
        let mut keys = Vec::with_capacity(4);
        if let Some(rule) = rule {
            keys.push(format!("{root}.{rule}.{predicate}.{arg_type}"));
            keys.push(format!("{root}.{rule}.{predicate}"));
        }
        keys.push(format!("{root}.{predicate}.{arg_type}"));
        keys.push(format!("{root}.{predicate}"));
        keys
    }

    /// Resolve the template for a predicate failure. Exhausting every
    /// candidate is an error, never an empty message.
    pub fn template(
        &self,
        rule: Option<&str>,
        predicate: &str,
        arg_type: &str,
    ) -> Result<Template, MessageError> {
        let locale = self.locale();
        let key = cache_key(locale, &self.config.root, rule, predicate, arg_type);

        let hit = self.cache.get(&key).map(|entry| entry.value().clone());
        let cached = match hit {
            Some(template) => template,
            None => {
                let found = self
                    .candidates(rule, predicate, arg_type)
                    .iter()
                    .find_map(|candidate| self.backend.lookup(candidate, locale));
                tracing::trace!(predicate, ?rule, found = found.is_some(), "template cache miss");
                self.cache.entry(key).or_insert(found).value().clone()
            }
        };

        cached.ok_or_else(|| {
            tracing::debug!(predicate, ?rule, locale, "no message template");
            MessageError::MissingMessage {
                predicate: predicate.to_string(),
                rule: rule.map(str::to_string),
                candidates: self.candidates(rule, predicate, arg_type),
            }
        })
    }

    /// Display name for a rule, falling back to the rule id itself.
    pub fn display_name(&self, rule: &str) -> String {
        let key = format!("{}.{}", self.config.rules_root, rule);
        self.backend
            .lookup(&key, self.locale())
            .map(|t| t.text)
            .unwrap_or_else(|| rule.to_string())
    }

    /// Forget every memoized template.
    pub fn reload(&self) {
        let dropped = self.cache.len();
        self.cache.clear();
        tracing::debug!(dropped, "template cache cleared");
    }

    pub fn cached_templates(&self) -> usize {
        self.cache.len()
    }
}

fn cache_key(
    locale: &str,
    root: &str,
    rule: Option<&str>,
    predicate: &str,
    arg_type: &str,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    (locale, root, rule, predicate, arg_type).hash(&mut hasher);
    hasher.finish()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
