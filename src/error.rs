use burn::record::RecorderError;
use thiserror::Error;

/// Errors raised while training or checkpointing an agent
#[derive(Debug, Error)]
pub enum Error {
    /// Writing progress output or a checkpoint file failed
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The agent's parameters could not be serialized
    #[error("failed to record agent parameters: {0:?}")]
    Record(RecorderError),
}

impl From<RecorderError> for Error {
    fn from(value: RecorderError) -> Self {
        Self::Record(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
