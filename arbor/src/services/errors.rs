use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted while reading or writing the recent worktree list.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("recent worktree store IO failed")]
    Io(#[from] std::io::Error),
    #[error("recent worktree store JSON failed")]
    Json(#[from] serde_json::Error),
}

/// Errors emitted by git subcommands.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to spawn git in {}", dir.display())]
    Spawn {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("`git {command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("git output was not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("failed to prepare worktree directory")]
    Io(#[from] std::io::Error),
}
