//! Error types for the eventmap ecosystem.

use thiserror::Error;

/// Errors that can occur in eventmap operations.
#[derive(Error, Debug)]
pub enum EventMapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Event source request timed out after {0}s")]
    FetchTimeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Unknown city '{0}'")]
    UnknownCity(String),
}

impl From<serde_json::Error> for EventMapError {
    fn from(err: serde_json::Error) -> Self {
        EventMapError::Serialization(err.to_string())
    }
}

/// Result type alias for eventmap operations.
pub type EventMapResult<T> = Result<T, EventMapError>;
