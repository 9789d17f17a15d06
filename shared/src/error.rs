//! Error types for the slot booking Lambda functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the slot booking Lambda functions.
#[derive(Error, Debug)]
pub enum Error {
    /// A slot, patient or parameter does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error (including secret resolution failures)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Slot store read/write failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A conditional store write found a different value than expected
    #[error("Condition failed: {0}")]
    ConditionFailed(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Access token could not be signed
    #[error("Token error: {0}")]
    Token(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::ConditionFailed(_) => 409,
            _ => 500,
        }
    }

    /// Message safe to return to a caller. Server-side failures are not described.
    pub fn public_message(&self) -> String {
        match self.status_code() {
            500 => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::Validation(errors.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Token(err.to_string())
    }
}
