//! Message layer errors: missing templates and unreadable locale data.

use std::path::PathBuf;

use sieve_eval::EvalError;

/// Errors resolving or loading message templates.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("no message template for predicate '{predicate}' (tried: {})", .candidates.join(", "))]
    MissingMessage {
        predicate: String,
        rule: Option<String>,
        candidates: Vec<String>,
    },

    #[error("invalid locale data: {message}")]
    InvalidLocale { message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors from a full validation pass.
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Message(#[from] MessageError),
}
