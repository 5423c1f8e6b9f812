use std::path::Path;

use super::{build_validator, print_messages, read_json};
use crate::config::CliConfig;
use crate::OutputFormat;

/// Print the static hints of a rule document.
pub(crate) fn cmd_hints(rules_path: &Path, config: &CliConfig, output: OutputFormat, quiet: bool) {
    let rules = read_json(rules_path, "rules", output, quiet);
    let validator = build_validator(&rules, config, output, quiet);
    let hints = validator.hints();

    match output {
        OutputFormat::Text => {
            if hints.is_empty() {
                if !quiet {
                    println!("no hints");
                }
            } else {
                print_messages(hints);
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&hints.to_json()).unwrap_or_default()
            );
        }
    }
}
