//! Message backends: where templates come from.
//!
//! The resolver only needs [`MessageBackend`]. [`YamlBackend`] is the
//! stock implementation, reading locale files shaped like:
//!
//! ```yaml
//! en:
//!   errors:
//!     filled?: "must be filled"
//!     size?:
//!       default: "size must be %{size}"
//!       range: "size must be within %{left} - %{right}"
//!   rules:
//!     email: "Email address"
//! ```
//!
//! A mapping with a `text` key is a single template; its other keys are
//! carried along as metadata.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::MessageError;

const BUILTIN_EN: &str = include_str!("../locales/en.yml");

/// A message template and optional metadata attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub text: String,
    pub meta: Option<Value>,
}

impl Template {
    pub fn text(text: impl Into<String>) -> Self {
        Template {
            text: text.into(),
            meta: None,
        }
    }
}

/// Source of localized templates. Implementations must fall back to
/// their default locale when `locale` has no entry for `key`.
pub trait MessageBackend: Send + Sync {
    fn lookup(&self, key: &str, locale: &str) -> Option<Template>;

    fn key_exists(&self, key: &str, locale: &str) -> bool {
        self.lookup(key, locale).is_some()
    }

    fn default_locale(&self) -> &str;
}

/// Templates loaded from YAML, flattened to `locale.dotted.key`.
#[derive(Debug, Clone)]
pub struct YamlBackend {
    default_locale: String,
    entries: HashMap<String, Template>,
}

impl YamlBackend {
    pub fn new(default_locale: impl Into<String>) -> Self {
        YamlBackend {
            default_locale: default_locale.into(),
            entries: HashMap::new(),
        }
    }

    /// The bundled English templates.
    pub fn builtin() -> Result<Self, MessageError> {
        YamlBackend::parse(BUILTIN_EN, "en")
    }

    pub fn parse(yaml: &str, default_locale: &str) -> Result<Self, MessageError> {
        let doc: Value = serde_yaml::from_str(yaml).map_err(|e| MessageError::InvalidLocale {
            message: format!("failed to parse locale YAML: {e}"),
        })?;
        let locales = doc.as_object().ok_or_else(|| MessageError::InvalidLocale {
            message: "locale file must be a mapping of locale names".to_string(),
        })?;

        let mut backend = YamlBackend::new(default_locale);
        for (locale, tree) in locales {
            flatten(locale, tree, &mut backend.entries);
        }
        tracing::debug!(entries = backend.entries.len(), "loaded locale data");
        Ok(backend)
    }

    /// The bundled templates with `files` merged over them in order.
    pub fn load<P: AsRef<Path>>(files: &[P], default_locale: &str) -> Result<Self, MessageError> {
        let mut backend = YamlBackend::parse(BUILTIN_EN, default_locale)?;
        for file in files {
            backend.merge(YamlBackend::from_path(file.as_ref(), default_locale)?);
        }
        Ok(backend)
    }

    pub fn from_path(path: &Path, default_locale: &str) -> Result<Self, MessageError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| MessageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        YamlBackend::parse(&yaml, default_locale)
    }

    /// Add `other`'s entries, replacing any with the same key.
    pub fn merge(&mut self, other: YamlBackend) -> &mut Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MessageBackend for YamlBackend {
    fn lookup(&self, key: &str, locale: &str) -> Option<Template> {
        self.entries
            .get(&format!("{locale}.{key}"))
            .or_else(|| {
                if locale == self.default_locale {
                    None
                } else {
                    self.entries.get(&format!("{}.{key}", self.default_locale))
                }
            })
            .cloned()
    }

    fn default_locale(&self) -> &str {
        &self.default_locale
    }
}

fn flatten(prefix: &str, node: &Value, out: &mut HashMap<String, Template>) {
    match node {
        Value::String(text) => {
            out.insert(prefix.to_string(), Template::text(text.clone()));
        }
        Value::Object(map) => match map.get("text") {
            Some(Value::String(text)) => {
                let meta: Map<String, Value> = map
                    .iter()
                    .filter(|(k, _)| k.as_str() != "text")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                out.insert(
                    prefix.to_string(),
                    Template {
                        text: text.clone(),
                        meta: (!meta.is_empty()).then_some(Value::Object(meta)),
                    },
                );
            }
            _ => {
                for (key, child) in map {
                    flatten(&format!("{prefix}.{key}"), child, out);
                }
            }
        },
        other => {
            tracing::warn!(key = prefix, value = %other, "ignoring non-text locale entry");
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_has_english_templates() {
        let backend = YamlBackend::builtin().unwrap();
        assert_eq!(
            backend.lookup("errors.filled?", "en"),
            Some(Template::text("must be filled"))
        );
        assert!(backend.key_exists("errors.size?.range", "en"));
        assert_eq!(backend.default_locale(), "en");
    }

    #[test]
    fn unknown_locale_falls_back_to_default() {
        let backend = YamlBackend::parse("en:\n  errors:\n    int?: must be an integer\n", "en")
            .unwrap();
        assert_eq!(
            backend.lookup("errors.int?", "pl").map(|t| t.text),
            Some("must be an integer".to_string())
        );
    }

    #[test]
    fn text_mappings_carry_metadata() {
        let yaml = "en:\n  errors:\n    filled?:\n      text: must be filled\n      code: 102\n";
        let backend = YamlBackend::parse(yaml, "en").unwrap();
        assert_eq!(
            backend.lookup("errors.filled?", "en"),
            Some(Template {
                text: "must be filled".to_string(),
                meta: Some(json!({"code": 102})),
            })
        );
    }

    #[test]
    fn merge_overrides_existing_entries() {
        let mut backend = YamlBackend::builtin().unwrap();
        let custom = YamlBackend::parse("en:\n  errors:\n    filled?: can't be blank\n", "en").unwrap();
        backend.merge(custom);
        assert_eq!(
            backend.lookup("errors.filled?", "en").map(|t| t.text),
            Some("can't be blank".to_string())
        );
    }

    #[test]
    fn rejects_non_mapping_documents() {
        assert!(matches!(
            YamlBackend::parse("- en\n", "en"),
            Err(MessageError::InvalidLocale { .. })
        ));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pl.yml");
        std::fs::write(&path, "pl:\n  errors:\n    filled?: musi być wypełnione\n").unwrap();
        let backend = YamlBackend::from_path(&path, "en").unwrap();
        assert!(backend.key_exists("errors.filled?", "pl"));
        assert!(!backend.key_exists("errors.filled?", "en"));

        assert!(matches!(
            YamlBackend::from_path(&dir.path().join("missing.yml"), "en"),
            Err(MessageError::Io { .. })
        ));
    }

    #[test]
    fn load_layers_files_over_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        std::fs::write(&path, "en:\n  errors:\n    int?: must be a whole number\n").unwrap();
        let backend = YamlBackend::load(&[&path], "en").unwrap();
        assert_eq!(
            backend.lookup("errors.int?", "en").map(|t| t.text),
            Some("must be a whole number".to_string())
        );
        assert!(backend.key_exists("errors.filled?", "en"));
    }
}
