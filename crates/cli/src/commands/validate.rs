use std::path::Path;
use std::process;

use sieve_messages::MessageOutcome;

use super::{build_validator, print_messages, read_json};
use crate::config::CliConfig;
use crate::{report_error, OutputFormat};

/// Exit status for input that fails validation.
pub(crate) const EXIT_INVALID: i32 = 2;

pub(crate) fn cmd_validate(
    rules_path: &Path,
    input_path: &Path,
    config: &CliConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let rules = read_json(rules_path, "rules", output, quiet);
    let input = read_json(input_path, "input", output, quiet);
    let validator = build_validator(&rules, config, output, quiet);

    let validation = match validator.validate(&input) {
        Ok(v) => v,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let messages = if config.hints {
        validation.messages()
    } else {
        validation.errors().clone()
    };

    match output {
        OutputFormat::Text => {
            if !quiet {
                if validation.success {
                    println!("valid");
                } else {
                    println!("invalid");
                    print_messages(&messages);
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "valid": validation.success,
                "errors": messages.to_json(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
    }

    if !validation.success {
        process::exit(EXIT_INVALID);
    }
}
