use std::{fmt::Display, io};

#[derive(Debug)]
pub enum Error {
    Connection { url: String, detail: String },
    RetryExhausted { endpoint: String, attempts: u32, last_error: String },
    Auth { status_code: u16 },
    Validation(String),
    Assertion(String),
    InvalidConfiguration { key: String, reason: String },
    Json(serde_json::Error),
    IoError(io::Error),
}

impl Error {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation(message.into())
    }

    pub fn assertion<S: Into<String>>(message: S) -> Self {
        Error::Assertion(message.into())
    }

    /// Whether a single attempt carrying this error is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Connection { url, detail } => {
                write!(f, "Connection to {} failed: {}", url, detail)
            }
            Error::RetryExhausted {
                endpoint,
                attempts,
                last_error,
            } => write!(
                f,
                "{} failed after {} attempts, last error: {}",
                endpoint, attempts, last_error
            ),
            Error::Auth { status_code } => {
                write!(f, "Authentication rejected with status {}", status_code)
            }
            Error::Validation(message) => write!(f, "Validation failed: {}", message),
            Error::Assertion(message) => write!(f, "Assertion failed: {}", message),
            Error::InvalidConfiguration { key, reason } => {
                write!(f, "Invalid configuration for '{}': {}", key, reason)
            }
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::IoError(e) => write!(f, "IoError: {}", e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
