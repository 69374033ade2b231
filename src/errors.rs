use thiserror::Error;

/// Error type that captures common calendar failures.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type CalendarResult<T> = Result<T, CalendarError>;
