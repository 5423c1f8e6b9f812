//! Resolved messages and the ordered, path-keyed message set.

use std::fmt;

use serde_json::{json, Map, Value};
use sieve_interchange::Args;

/// Key under which a node's own messages render when it also has children,
/// and under which whole-input messages render at the top level.
pub const BASE_KEY: &str = "base";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Error,
    Hint,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub path: Vec<PathSegment>,
    pub rule: Option<String>,
    /// Predicate id as looked up, `not_` prefix included for negations.
    pub predicate: String,
    /// Predicate arguments, the subject excluded.
    pub args: Args,
    pub text: String,
    pub meta: Option<Value>,
    pub kind: MessageKind,
}

impl Message {
    /// Dotted path, e.g. `address.street` or `tags.1`.
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(PathSegment::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn same_signature(&self, other: &Message) -> bool {
        self.path == other.path
            && self.kind == other.kind
            && self.rule == other.rule
            && self.predicate == other.predicate
            && self.args == other.args
    }

    /// Plain text, or `{text, meta}` when metadata is attached.
    pub fn to_json(&self) -> Value {
        match &self.meta {
            Some(meta) => json!({ "text": self.text, "meta": meta }),
            None => Value::String(self.text.clone()),
        }
    }
}

impl PartialEq<str> for Message {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for Message {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Messages in first-insertion order, deduplicated by path, kind, rule,
/// predicate and arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageSet {
    messages: Vec<Message>,
}

impl MessageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message unless an equivalent one is present. Returns whether
    /// it was added.
    pub fn push(&mut self, message: Message) -> bool {
        if self.messages.iter().any(|m| m.same_signature(&message)) {
            return false;
        }
        self.messages.push(message);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages recorded at exactly `path`.
    pub fn at<'a>(&'a self, path: &'a [PathSegment]) -> impl Iterator<Item = &'a Message> {
        self.messages.iter().filter(move |m| m.path == path)
    }

    /// Nested mapping of path segments to message lists. Array indices
    /// become string keys.
    pub fn to_json(&self) -> Value {
        let mut root = Node::default();
        for message in &self.messages {
            root.insert(&message.path, message.to_json());
        }
        root.render(true)
    }
}

impl Extend<Message> for MessageSet {
    fn extend<I: IntoIterator<Item = Message>>(&mut self, iter: I) {
        for message in iter {
            self.push(message);
        }
    }
}

impl<'a> IntoIterator for &'a MessageSet {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[derive(Default)]
struct Node {
    messages: Vec<Value>,
    children: Vec<(String, Node)>,
}

impl Node {
    fn insert(&mut self, path: &[PathSegment], message: Value) {
        let Some((head, rest)) = path.split_first() else {
            self.messages.push(message);
            return;
        };
        let key = head.to_string();
        let index = match self.children.iter().position(|(k, _)| *k == key) {
            Some(i) => i,
            None => {
                self.children.push((key, Node::default()));
                self.children.len() - 1
            }
        };
        self.children[index].1.insert(rest, message);
    }

    fn render(self, top: bool) -> Value {
        if self.children.is_empty() && !top {
            return Value::Array(self.messages);
        }
        let mut map = Map::new();
        if !self.messages.is_empty() {
            map.insert(BASE_KEY.to_string(), Value::Array(self.messages));
        }
        for (key, child) in self.children {
            map.insert(key, child.render(false));
        }
        Value::Object(map)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(path: &[PathSegment], predicate: &str, text: &str) -> Message {
        Message {
            path: path.to_vec(),
            rule: path.iter().rev().find_map(|s| match s {
                PathSegment::Key(k) => Some(k.clone()),
                PathSegment::Index(_) => None,
            }),
            predicate: predicate.to_string(),
            args: Vec::new(),
            text: text.to_string(),
            meta: None,
            kind: MessageKind::Error,
        }
    }

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn nests_by_path_in_insertion_order() {
        let mut set = MessageSet::new();
        set.push(msg(&[key("email")], "filled?", "must be filled"));
        set.push(msg(&[key("address"), key("street")], "key?", "is missing"));
        set.push(msg(&[key("tags"), PathSegment::Index(1)], "filled?", "must be filled"));
        assert_eq!(
            set.to_json(),
            json!({
                "email": ["must be filled"],
                "address": {"street": ["is missing"]},
                "tags": {"1": ["must be filled"]}
            })
        );
        let keys: Vec<_> = set.to_json().as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["email", "address", "tags"]);
    }

    #[test]
    fn deduplicates_by_signature() {
        let mut set = MessageSet::new();
        assert!(set.push(msg(&[key("age")], "gt?", "must be greater than 18")));
        assert!(!set.push(msg(&[key("age")], "gt?", "must be greater than 18")));
        assert!(set.push(msg(&[key("age")], "int?", "must be an integer")));
        assert_eq!(set.len(), 2);
        assert!(set.at(&[key("age")]).next().unwrap() == "must be greater than 18");
    }

    #[test]
    fn mixed_nodes_use_base() {
        let mut set = MessageSet::new();
        set.push(msg(&[], "hash?", "must be a hash"));
        set.push(msg(&[key("address")], "size?", "size must be 2"));
        set.push(msg(&[key("address"), key("city")], "filled?", "must be filled"));
        assert_eq!(
            set.to_json(),
            json!({
                "base": ["must be a hash"],
                "address": {"base": ["size must be 2"], "city": ["must be filled"]}
            })
        );
    }

    #[test]
    fn metadata_renders_as_object() {
        let mut message = msg(&[key("age")], "gt?", "too young");
        message.meta = Some(json!({"code": 7}));
        assert_eq!(message.to_json(), json!({"text": "too young", "meta": {"code": 7}}));
        assert_eq!(message.dotted_path(), "age");
    }
}
