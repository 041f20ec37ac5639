use thiserror::Error;

use crate::targeting::ValidationError;

pub type AdServerResult<T> = Result<T, AdServerError>;

#[derive(Error, Debug)]
pub enum AdServerError {
    /// Raised by flight stores backed by external storage.
    #[error("Flight store error: {0}")]
    Store(String),

    #[error("Invalid targeting for flight {flight}: {source}")]
    Validation {
        flight: String,
        #[source]
        source: ValidationError,
    },

    #[error("Unknown publisher: {0}")]
    UnknownPublisher(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
