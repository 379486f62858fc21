//! Common error types for MusicLibrary

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Common result type for MusicLibrary operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the MusicLibrary crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Form validation failed; carries field-level messages
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Operation would break a relationship that other rows depend on
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}
