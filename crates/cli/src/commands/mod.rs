pub(crate) mod check;
pub(crate) mod hints;
pub(crate) mod validate;

use std::path::Path;
use std::process;

use sieve_eval::PredicateRegistry;
use sieve_messages::{Message, MessageKind, MessageSet, Validator, YamlBackend};

use crate::config::CliConfig;
use crate::{report_error, OutputFormat};

/// Read and parse a JSON file, exiting with status 1 on failure.
pub(crate) fn read_json(path: &Path, what: &str, output: OutputFormat, quiet: bool) -> serde_json::Value {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error: {} file '{}': {}", what, path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("error: invalid JSON in {}: {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Compile `rules` and load templates per `config`, exiting with status 1
/// on any configuration error.
pub(crate) fn build_validator(
    rules: &serde_json::Value,
    config: &CliConfig,
    output: OutputFormat,
    quiet: bool,
) -> Validator {
    let backend = match YamlBackend::load(&config.locale_files, &config.messages.default_locale) {
        Ok(b) => b,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    match Validator::from_json(
        rules,
        &PredicateRegistry::default(),
        backend,
        config.messages.clone(),
    ) {
        Ok(v) => v,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

/// One line per message: `path: text`, with whole-input messages under
/// `base`.
pub(crate) fn print_messages(set: &MessageSet) {
    for message in set {
        println!("  {}", message_line(message));
    }
}

fn message_line(message: &Message) -> String {
    let path = match message.dotted_path() {
        p if p.is_empty() => sieve_messages::message::BASE_KEY.to_string(),
        p => p,
    };
    match message.kind {
        MessageKind::Error => format!("{}: {}", path, message.text),
        MessageKind::Hint => format!("{}: {} (hint)", path, message.text),
    }
}
