//! `sieve.toml` configuration.
//!
//! # Example
//!
//! ```toml
//! locale_files = ["locales/pl.yml"]
//! hints = true
//!
//! [messages]
//! locale = "pl"
//! full = true
//! ```
//!
//! Every key is optional. Command-line flags override file values, and
//! `--messages` files are layered after the ones listed here.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sieve_messages::MessagesConfig;

/// File looked up in the working directory when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "sieve.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct CliConfig {
    pub messages: MessagesConfig,
    /// Locale files merged over the bundled templates, in order. Relative
    /// paths are resolved against the config file's directory.
    pub locale_files: Vec<PathBuf>,
    /// Add hints for failing paths to `validate` output.
    pub hints: bool,
}

/// Message-related flags shared by `validate` and `hints`.
#[derive(Debug, Clone, Default)]
pub(crate) struct MessageFlags {
    pub messages: Vec<PathBuf>,
    pub locale: Option<String>,
    pub full: bool,
    pub hints: bool,
}

impl CliConfig {
    /// Load `explicit`, or `sieve.toml` from the working directory when it
    /// exists, or the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<CliConfig, String> {
        match explicit {
            Some(path) => CliConfig::read(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    CliConfig::read(path)
                } else {
                    Ok(CliConfig::default())
                }
            }
        }
    }

    pub fn read(path: &Path) -> Result<CliConfig, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
        let mut config: CliConfig = toml::from_str(&content)
            .map_err(|e| format!("could not parse '{}': {}", path.display(), e))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for file in &mut config.locale_files {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn apply(&mut self, flags: &MessageFlags) {
        self.locale_files.extend(flags.messages.iter().cloned());
        if let Some(locale) = &flags.locale {
            self.messages.locale = Some(locale.clone());
        }
        self.messages.full |= flags.full;
        self.hints |= flags.hints;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_nested_messages_table() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sieve.toml");
        std::fs::write(
            &path,
            "locale_files = [\"pl.yml\"]\nhints = true\n\n[messages]\nlocale = \"pl\"\n",
        )
        .unwrap();

        let config = CliConfig::read(&path).unwrap();
        assert!(config.hints);
        assert_eq!(config.messages.locale.as_deref(), Some("pl"));
        assert_eq!(config.messages.root, "errors");
        assert_eq!(config.locale_files, vec![tmp.path().join("pl.yml")]);
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = CliConfig {
            locale_files: vec![PathBuf::from("a.yml")],
            ..CliConfig::default()
        };
        config.messages.locale = Some("pl".to_string());
        config.apply(&MessageFlags {
            messages: vec![PathBuf::from("b.yml")],
            locale: Some("de".to_string()),
            full: true,
            hints: false,
        });
        assert_eq!(config.messages.locale.as_deref(), Some("de"));
        assert!(config.messages.full);
        assert!(!config.hints);
        assert_eq!(
            config.locale_files,
            vec![PathBuf::from("a.yml"), PathBuf::from("b.yml")]
        );
    }

    #[test]
    fn unreadable_or_malformed_files_are_errors() {
        let tmp = TempDir::new().unwrap();
        assert!(CliConfig::load(Some(&tmp.path().join("missing.toml"))).is_err());

        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "hints = \"yes\"\n").unwrap();
        let err = CliConfig::read(&path).unwrap_err();
        assert!(err.contains("could not parse"));
    }
}
