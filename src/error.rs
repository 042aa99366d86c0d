//! Error types for a3s-relay

use thiserror::Error;

/// Errors that can occur while talking to the relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// Identifier is not made of word characters only
    #[error("Identifier must be alphanumeric, \"{0}\" given")]
    InvalidIdentifier(String),

    /// Cursor is present but is not a non-negative integer
    #[error("Cursor must be an integer, \"{0}\" given")]
    InvalidCursor(String),

    /// Watch position is not a non-negative integer
    #[error("Position value must be integer, \"{0}\" given")]
    InvalidPosition(String),

    /// Dynamic publish targets are neither a list nor a mapping
    #[error("Targets must be a list of ids or a map of id => cursor: {0}")]
    InvalidTargets(String),

    /// Response bytes do not form an HTTP message
    #[error("Non-HTTP response received:\n{0}")]
    NonHttpResponse(String),

    /// Relay answered with a status other than 200
    #[error("Request failed: {status}\n{body}")]
    RequestFailed {
        status: String,
        body: String,
    },

    /// Response headers carry no Content-Length
    #[error("No Content-Length header in response headers:\n{0}")]
    MissingContentLength(String),

    /// Body length disagrees with the declared Content-Length
    #[error(
        "Response length ({actual}) is different than specified in Content-Length header ({expected}): possibly broken response"
    )]
    LengthMismatch {
        actual: usize,
        expected: usize,
    },

    /// Relay kept sending past the response size cap
    #[error("Response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },

    /// Message serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Connect or TLS handshake failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Write/read failure on an established connection
    #[error("Transport error: {0}")]
    Transport(String),

    /// Timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
