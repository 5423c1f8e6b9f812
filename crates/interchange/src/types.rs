//! Typed AST nodes for the Sieve interchange format.
//!
//! Predicate arguments are carried as ordered `(name, value)` pairs so
//! that message templates can address them by name without consulting
//! the predicate registry.

use std::fmt;

use serde_json::Value;

/// Ordered, named predicate arguments.
pub type Args = Vec<(String, Value)>;

/// A path of hash keys into the input, outermost first.
pub type KeyPath = Vec<String>;

// ── Connectives ─────────────────────────────────────────────────────

/// Binary connective joining two rule nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
    Xor,
    Implication,
}

impl Connective {
    /// Tag used for this connective in the interchange format.
    pub fn tag(self) -> &'static str {
        match self {
            Connective::And => "and",
            Connective::Or => "or",
            Connective::Xor => "xor",
            Connective::Implication => "implication",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Connective> {
        match tag {
            "and" => Some(Connective::And),
            "or" => Some(Connective::Or),
            "xor" => Some(Connective::Xor),
            "implication" => Some(Connective::Implication),
            _ => None,
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ── Rule AST ────────────────────────────────────────────────────────

/// A serialized rule tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleAst {
    /// `["predicate", [id, [[arg, value], ...]]]`
    Predicate { id: String, args: Args },
    /// `["not", node]`
    Not(Box<RuleAst>),
    /// `["val", [name, node]]`
    Val {
        name: Option<String>,
        node: Box<RuleAst>,
    },
    /// `["key", [name, node]]`
    Key { name: String, node: Box<RuleAst> },
    /// `["each", [name, node]]`
    Each {
        name: Option<String>,
        node: Box<RuleAst>,
    },
    /// `["set", [name, [node, ...]]]`
    Set {
        name: Option<String>,
        nodes: Vec<RuleAst>,
    },
    /// `["and" | "or" | "xor" | "implication", [left, right]]`
    Composite {
        op: Connective,
        left: Box<RuleAst>,
        right: Box<RuleAst>,
    },
    /// `["group", [name, [name, ...], node]]`
    Group {
        name: String,
        names: Vec<String>,
        node: Box<RuleAst>,
    },
    /// `["check", [name, [[key, ...], ...], node]]`
    ///
    /// Each key path is read from the input; the values are passed to the
    /// predicate in order.
    Check {
        name: String,
        keys: Vec<KeyPath>,
        node: Box<RuleAst>,
    },
}

impl RuleAst {
    pub fn predicate(id: impl Into<String>, args: Args) -> RuleAst {
        RuleAst::Predicate {
            id: id.into(),
            args,
        }
    }

    pub fn negated(node: RuleAst) -> RuleAst {
        RuleAst::Not(Box::new(node))
    }

    pub fn val(name: Option<&str>, node: RuleAst) -> RuleAst {
        RuleAst::Val {
            name: name.map(str::to_string),
            node: Box::new(node),
        }
    }

    pub fn key(name: impl Into<String>, node: RuleAst) -> RuleAst {
        RuleAst::Key {
            name: name.into(),
            node: Box::new(node),
        }
    }

    pub fn each(name: Option<&str>, node: RuleAst) -> RuleAst {
        RuleAst::Each {
            name: name.map(str::to_string),
            node: Box::new(node),
        }
    }

    pub fn set(name: Option<&str>, nodes: Vec<RuleAst>) -> RuleAst {
        RuleAst::Set {
            name: name.map(str::to_string),
            nodes,
        }
    }

    pub fn composite(op: Connective, left: RuleAst, right: RuleAst) -> RuleAst {
        RuleAst::Composite {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: RuleAst, right: RuleAst) -> RuleAst {
        RuleAst::composite(Connective::And, left, right)
    }

    pub fn or(left: RuleAst, right: RuleAst) -> RuleAst {
        RuleAst::composite(Connective::Or, left, right)
    }

    /// The tag this node is written with.
    pub fn tag(&self) -> &'static str {
        match self {
            RuleAst::Predicate { .. } => "predicate",
            RuleAst::Not(_) => "not",
            RuleAst::Val { .. } => "val",
            RuleAst::Key { .. } => "key",
            RuleAst::Each { .. } => "each",
            RuleAst::Set { .. } => "set",
            RuleAst::Composite { op, .. } => op.tag(),
            RuleAst::Group { .. } => "group",
            RuleAst::Check { .. } => "check",
        }
    }
}

// ── Error AST ───────────────────────────────────────────────────────

/// A serialized failure tree, produced from evaluated results.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorAst {
    /// `["input", [name, value, [node, ...]]]`
    ///
    /// Sets the rule-name and value context for the nested nodes. A
    /// present `name` also extends the message path by one key.
    Input {
        name: Option<String>,
        value: Value,
        nodes: Vec<ErrorAst>,
    },
    /// `["predicate", [id, [[arg, value], ...]]]`
    Predicate { id: String, args: Args },
    /// `["not", node]`
    Not(Box<ErrorAst>),
    /// `["set", [node, ...]]`
    Set(Vec<ErrorAst>),
    /// `["each", [node, ...]]`, children are `El` nodes.
    Each(Vec<ErrorAst>),
    /// `["el", [index, node]]`
    El { index: usize, node: Box<ErrorAst> },
    /// `["check", [name, node]]`
    Check { name: String, node: Box<ErrorAst> },
    /// `["xor", [left, right]]`
    Xor(Box<ErrorAst>, Box<ErrorAst>),
}

impl ErrorAst {
    pub fn tag(&self) -> &'static str {
        match self {
            ErrorAst::Input { .. } => "input",
            ErrorAst::Predicate { .. } => "predicate",
            ErrorAst::Not(_) => "not",
            ErrorAst::Set(_) => "set",
            ErrorAst::Each(_) => "each",
            ErrorAst::El { .. } => "el",
            ErrorAst::Check { .. } => "check",
            ErrorAst::Xor(..) => "xor",
        }
    }
}
