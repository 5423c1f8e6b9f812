//! sieve-interchange: Shared rule/error AST types and their JSON form.
//!
//! Both ASTs travel as nested tagged arrays (`[tag, payload]`):
//!
//! - [`RuleAst`] is what the rule compiler consumes and what a compiled
//!   rule tree exports back via `to_ast`.
//! - [`ErrorAst`] is what an evaluated failure exports and what the
//!   message compiler consumes.
//!
//! Keeping both in one leaf crate lets the evaluator and the message
//! layer agree on the contract without depending on each other.

pub mod deserialize;
pub mod serialize;
pub mod types;

pub use deserialize::{error_ast_from_json, rule_ast_from_json, rules_from_json, InterchangeError};
pub use serialize::{error_ast_to_json, rule_ast_to_json, rules_to_json};
pub use types::*;
