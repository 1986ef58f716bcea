//! Error types for the DynaRAG client

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by DynaRAG operations.
///
/// An empty store is never an error: operations that return lists report it
/// as `None` instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    /// The server rejected the request (HTTP 400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Error::BadRequest(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Map a non-success HTTP status and its body to an error kind.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.trim().is_empty() {
            "no response body".to_string()
        } else {
            body.trim().to_string()
        };

        match status {
            400 => Error::BadRequest(message),
            401 | 403 => Error::Authentication(message),
            _ => Error::Api { status, message },
        }
    }
}
