//! Predicate registry: maps predicate ids to their definitions.
//!
//! Ids are resolved once, when rules are compiled. Evaluation never
//! dispatches by name.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::builtins;
use crate::predicate::{Predicate, PredicateFn};
use crate::types::EvalError;

/// A registered predicate: id, leading argument names and function.
#[derive(Clone)]
pub struct PredicateDef {
    pub id: Arc<str>,
    pub arg_names: Arc<[String]>,
    pub func: PredicateFn,
}

impl PredicateDef {
    /// A fresh, uncurried predicate for this definition.
    pub fn instantiate(&self) -> Predicate {
        Predicate::new(self.id.clone(), self.arg_names.clone(), self.func.clone())
    }
}

pub struct PredicateRegistry {
    defs: HashMap<String, PredicateDef>,
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        let mut registry = PredicateRegistry::empty();
        builtins::install(&mut registry);
        registry
    }
}

impl PredicateRegistry {
    /// A registry with no predicates, not even the built-ins.
    pub fn empty() -> Self {
        PredicateRegistry {
            defs: HashMap::new(),
        }
    }

    /// Register `func` under `id`, replacing any previous definition.
    pub fn register<F>(&mut self, id: &str, arg_names: &[&str], func: F) -> &mut Self
    where
        F: Fn(&[Value]) -> bool + Send + Sync + 'static,
    {
        let def = PredicateDef {
            id: Arc::from(id),
            arg_names: arg_names.iter().map(|s| s.to_string()).collect(),
            func: Arc::new(func),
        };
        if self.defs.insert(id.to_string(), def).is_some() {
            tracing::debug!(predicate = id, "predicate definition replaced");
        }
        self
    }

    pub fn definition(&self, id: &str) -> Result<&PredicateDef, EvalError> {
        self.defs.get(id).ok_or_else(|| EvalError::UnknownPredicate {
            id: id.to_string(),
        })
    }

    /// Resolve `id` to an uncurried predicate.
    pub fn resolve(&self, id: &str) -> Result<Predicate, EvalError> {
        self.definition(id).map(PredicateDef::instantiate)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.defs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
