use thiserror::Error;

use fintrack_config::ConfigError;
use fintrack_core::{CoreError, ErrorKind};

/// Error type surfaced by the engine facade and its workflows.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Classification for caller-side messaging. Configuration problems count
    /// as validation failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(err) => err.kind(),
            EngineError::Config(ConfigError::Io(_)) => ErrorKind::Storage,
            EngineError::Config(_) => ErrorKind::Validation,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
