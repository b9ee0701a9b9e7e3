use arbor_engine::EngineError;
use thiserror::Error;

/// Errors surfaced to the user when opening tabs.
#[derive(Debug, Error)]
pub enum TabError {
    #[error(
        "Cannot open {display}: '{executable}' was not found in your PATH.\n\nYou can configure the command in Settings."
    )]
    ToolUnavailable { display: String, executable: String },
    #[error("tool command is not valid shell syntax")]
    InvalidCommand(#[from] shell_words::ParseError),
    #[error("terminal surface could not be created")]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, TabError>;
