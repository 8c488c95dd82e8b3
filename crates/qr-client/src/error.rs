//! Error types for the Qryti client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], cheap to copy into outcomes and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response reached the client
    Network,
    /// A 401 that could not be resolved by refreshing
    Unauthorized,
    /// The session is gone and the user must log in again
    SessionExpired,
    /// Non-2xx response carrying a server message
    ServerError,
    /// Client-side or server-reported input validation failure
    ValidationError,
    /// Response body did not have the expected shape
    Decode,
    /// Credential store could not be read or written
    Storage,
    /// Operation not offered by the resource
    Unsupported,
    /// Invalid client configuration
    Config,
}

/// Error types for the Qryti client
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure (DNS, connection refused, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Refresh failed or no refresh token was available
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    /// 401 after the single refresh-and-retry, or on a public call
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Non-2xx response
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Input rejected before or by the server
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response decoded but was not shaped as expected
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Credential store failure
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) => ErrorKind::Network,
            Error::SessionExpired => ErrorKind::SessionExpired,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Server { .. } => ErrorKind::ServerError,
            Error::Validation(_) => ErrorKind::ValidationError,
            Error::Json(_) | Error::Decode(_) => ErrorKind::Decode,
            Error::Storage(_) => ErrorKind::Storage,
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Text suitable for an error toast. Server messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Error::Network(_) => "Network error. Please check your connection.".to_string(),
            Error::SessionExpired => self.to_string(),
            Error::Unauthorized(message)
            | Error::Server { message, .. }
            | Error::Validation(message) => message.clone(),
            _ => "An unexpected error occurred. Please try again.".to_string(),
        }
    }

    /// Build an error from a non-2xx status and the parsed error body.
    ///
    /// `discriminator` is the server's `error` field; anything ending in
    /// `validation_error` is reported as [`Error::Validation`].
    pub fn from_status(status: reqwest::StatusCode, discriminator: Option<&str>, message: String) -> Self {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Unauthorized(message);
        }
        match discriminator {
            Some(kind) if kind.ends_with("validation_error") => Error::Validation(message),
            _ => Error::Server {
                status: status.as_u16(),
                message,
            },
        }
    }
}
