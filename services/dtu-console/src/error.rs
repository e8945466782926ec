//! Error types for the DTU console runtime

use serde::{Deserialize, Serialize};

/// Error shape handed to the error view: the server message (or status
/// text) and the numeric HTTP status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedError {
    pub message: String,
    pub status: u16,
}

impl std::fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (status {})", self.message, self.status)
    }
}

/// Outcome of classifying an API response at the interception boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The device answered 401; the session has been terminated
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(NormalizedError),

    #[error("Invalid response body: {0}")]
    Parse(String),

    /// No response was received at all
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Errors that can occur in the DTU console runtime
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Locale error: {0}")]
    Locale(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;
