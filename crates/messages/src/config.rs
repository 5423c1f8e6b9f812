//! Message resolution settings.

use serde::Deserialize;

/// Where templates live in the backend and how they are rendered.
///
/// Deserializable so that it can be embedded in a larger config file;
/// omitted fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Key prefix for message templates.
    pub root: String,
    /// Key prefix for rule display names.
    pub rules_root: String,
    /// Locale to render in. `None` uses the backend's default locale.
    pub locale: Option<String>,
    /// Prefix each message with its rule's display name.
    pub full: bool,
    /// Locale the YAML backend falls back to.
    pub default_locale: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        MessagesConfig {
            root: "errors".to_string(),
            rules_root: "rules".to_string(),
            locale: None,
            full: false,
            default_locale: "en".to_string(),
        }
    }
}
