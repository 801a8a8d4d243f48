//! Crate error types

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stats blob is not a JSON object")]
    MalformedStats,

    #[error("no games registered")]
    EmptyRegistry,

    #[error("corpus file not found: {name}")]
    CorpusNotFound { name: String },

    #[error("corpus '{name}' has {size} words, need at least {needed}")]
    CorpusTooSmall {
        name: String,
        size: usize,
        needed: usize,
    },

    #[error("unknown trigger command: {0:?}")]
    UnknownTrigger(String),

    #[error("invalid trigger argument: {0}")]
    TriggerArgument(String),

    #[error("configuration error: {message}")]
    Config { message: String },
}

/// Rejected player input. Never mutates game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("nothing entered")]
    Empty,

    #[error("not a number")]
    NotANumber,

    #[error("game is not accepting input")]
    NotAccepting,
}
