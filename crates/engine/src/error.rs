//! Engine errors.

use thiserror::Error;

use crate::config::ConfigError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to start push worker: {0}")]
    PushWorker(#[from] modeglue_variables::VariableError),
}
