use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors originating from the `arbor-engine` runtime.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("engine construction failed: {0}")]
    Construct(String),

    #[error("surface creation failed: {0}")]
    SurfaceCreate(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
