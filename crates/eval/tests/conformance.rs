//! Evaluator conformance test suite.
//!
//! Each test case is a fixture triplet under `conformance/eval/`:
//! - `<name>.rules.json`  -- rule AST document
//! - `<name>.input.json`  -- input to validate
//! - `<name>.errors.json` -- expected error AST list
//!
//! The runner compiles the rules with the built-in registry, evaluates
//! the input and compares the exported error AST against the fixture.

use std::path::{Path, PathBuf};

use sieve_interchange::error_ast_to_json;

fn read_json(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("Invalid JSON in {}: {}", path.display(), e))
}

/// Run an evaluator conformance fixture.
///
/// 1. Load .rules.json and .input.json
/// 2. Compile and evaluate
/// 3. Compare the error AST against .errors.json
fn run_eval_fixture(name: &str) {
    let dir = fixture_dir();
    let rules = read_json(&dir.join(format!("{}.rules.json", name)));
    let input = read_json(&dir.join(format!("{}.input.json", name)));
    let expected = read_json(&dir.join(format!("{}.errors.json", name)));

    let outcome = sieve_eval::evaluate(&rules, &input)
        .unwrap_or_else(|e| panic!("Evaluation failed for {}: {}", name, e));

    let actual = serde_json::Value::Array(outcome.error_ast.iter().map(error_ast_to_json).collect());
    assert_eq!(
        outcome.success,
        actual.as_array().is_some_and(|a| a.is_empty()),
        "success flag disagrees with error AST for {}",
        name
    );
    assert_eq!(
        actual,
        expected,
        "Error AST mismatch for {}\n\nActual:\n{}\n\nExpected:\n{}",
        name,
        serde_json::to_string_pretty(&actual).unwrap(),
        serde_json::to_string_pretty(&expected).unwrap(),
    );
}

/// Run a fixture that must fail with a configuration error.
fn run_eval_fixture_error(name: &str) {
    let dir = fixture_dir();
    let rules = read_json(&dir.join(format!("{}.rules.json", name)));
    let input = read_json(&dir.join(format!("{}.input.json", name)));

    let result = sieve_eval::evaluate(&rules, &input);
    assert!(
        result.is_err(),
        "Expected evaluation error for {}, but got {:?}",
        name,
        result
    );
}

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("conformance")
        .join("eval")
}

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

#[test]
fn required_fields() {
    run_eval_fixture("required_fields");
}

#[test]
fn valid_input() {
    run_eval_fixture("valid_input");
}

#[test]
fn missing_key() {
    run_eval_fixture("missing_key");
}

#[test]
fn nested_set() {
    run_eval_fixture("nested_set");
}

#[test]
fn each_elements() {
    run_eval_fixture("each_elements");
}

#[test]
fn each_not_array() {
    run_eval_fixture_error("each_not_array");
}

#[test]
fn maybe_value() {
    run_eval_fixture("maybe_value");
}

#[test]
fn maybe_value_invalid() {
    run_eval_fixture("maybe_value_invalid");
}

#[test]
fn group_mismatch() {
    run_eval_fixture("group_mismatch");
}

#[test]
fn group_skipped() {
    run_eval_fixture("group_skipped");
}
