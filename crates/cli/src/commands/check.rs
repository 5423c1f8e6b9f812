use std::path::Path;
use std::process;

use sieve_eval::{PredicateRegistry, Schema};

use super::read_json;
use crate::{report_error, OutputFormat};

static RULE_AST_SCHEMA_STR: &str = include_str!("../../../../docs/rule-ast.schema.json");

/// Validate a rule document against the rule-AST JSON Schema, compile it
/// with the built-in predicates and print its canonical form.
pub(crate) fn cmd_check(rules_path: &Path, output: OutputFormat, quiet: bool) {
    let schema_doc: serde_json::Value = match serde_json::from_str(RULE_AST_SCHEMA_STR) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("internal error: failed to parse embedded rule schema: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let validator = match jsonschema::validator_for(&schema_doc) {
        Ok(v) => v,
        Err(e) => {
            let msg = format!("internal error: failed to compile rule schema: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let doc = read_json(rules_path, "rules", output, quiet);

    let errors: Vec<String> = validator
        .iter_errors(&doc)
        .map(|e| format!("{}", e))
        .collect();
    if !errors.is_empty() {
        match output {
            OutputFormat::Text => {
                if !quiet {
                    eprintln!("invalid rule document");
                    for err in &errors {
                        eprintln!("  - {}", err);
                    }
                }
            }
            OutputFormat::Json => {
                let json = serde_json::json!({ "valid": false, "errors": errors });
                eprintln!(
                    "{}",
                    serde_json::to_string_pretty(&json).unwrap_or_default()
                );
            }
        }
        process::exit(1);
    }

    let schema = match Schema::from_json(&doc, &PredicateRegistry::default()) {
        Ok(s) => s,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    tracing::debug!(rules = schema.rules().len(), "rule document compiled");

    let canonical = sieve_interchange::rules_to_json(&schema.to_ast());
    let printed = match output {
        OutputFormat::Text => canonical,
        OutputFormat::Json => serde_json::json!({ "valid": true, "rules": canonical }),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&printed).unwrap_or_default()
    );
}
