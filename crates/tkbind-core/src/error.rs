//! Error types for the tkbind binding layer

use thiserror::Error;

/// Errors surfaced by the binding layer
#[derive(Debug, Error)]
pub enum TkError {
    /// The runtime rejected or failed a command
    #[error("command `{command}` failed: {message}")]
    Eval { command: String, message: String },

    /// Writing a runtime variable failed
    #[error("failed to set variable `{name}`: {message}")]
    SetVar { name: String, message: String },

    /// Another interpreter is already bound to the calling thread
    #[error("an interpreter is already bound to this thread")]
    ContextAlreadyBound,

    /// The interpreter behind a weak handle has been dropped
    #[error("interpreter has been dropped")]
    InterpreterGone,

    /// The runtime could not be initialized
    #[error("failed to initialize runtime: {0}")]
    RuntimeInit(String),

    /// A widget key does not refer to a live widget
    #[error("unknown widget key")]
    UnknownWidget,

    /// Configuration file could not be read
    #[error("failed to read config: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl TkError {
    /// Build an evaluation error from the command text and the runtime diagnostic
    pub fn eval(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Eval {
            command: command.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for binding operations
pub type TkResult<T> = Result<T, TkError>;
