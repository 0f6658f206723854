use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("Serde operation failed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Activity signal is invalid: {0}")]
    InvalidSignal(String),
    #[error("Failed to apply the volume command: {0}")]
    ActuationFailure(String),
    #[error("Configuration is invalid: {0}")]
    InvalidConfig(String),
    #[error("Media pipeline operation failed: {0}")]
    Pipeline(String),
    #[error("The transition from the current runnable state to the next one is forbidden")]
    WrongRunnableState,
    #[error("Other error occured: {0}")]
    Other(String),
}

impl Error {
    /// Errors after which the observation loop keeps going with the last
    /// issued volume command.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidSignal(_) | Self::ActuationFailure(_))
    }
}
