//! Sieve messages: turns evaluation failures into localized, path-keyed
//! messages.
//!
//! The pipeline is error AST → [`MessageCompiler`] → [`MessageSet`].
//! Templates come from a [`MessageBackend`] (YAML by default) through the
//! lookup protocol in [`lookup`]. [`HintCompiler`] derives hints from rule
//! ASTs, and [`Validator`] ties evaluation and rendering together.

pub mod backend;
pub mod compiler;
pub mod config;
pub mod error;
pub mod hints;
pub mod lookup;
pub mod message;
pub mod tokens;
pub mod validator;

pub use backend::{MessageBackend, Template, YamlBackend};
pub use compiler::MessageCompiler;
pub use config::MessagesConfig;
pub use error::{MessageError, ValidatorError};
pub use hints::HintCompiler;
pub use lookup::MessageResolver;
pub use message::{Message, MessageKind, MessageSet, PathSegment};
pub use validator::{MessageOutcome, Validation, Validator};
