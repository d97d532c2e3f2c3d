//! Error types for caixa-core

use thiserror::Error;

/// Result type alias for caixa-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in caixa-core
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Input rejected before it reaches a table
    #[error("Validation error: {message}")]
    Validation {
        /// Field or aspect that failed validation
        field: Option<String>,
        /// What went wrong
        message: String,
    },

    /// A cell could not be coerced to the expected type
    #[error("Coercion error: {0}")]
    Coercion(#[from] crate::coerce::CoercionError),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a new validation error with a field name.
    pub fn validation_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Whether the error was caused by user input rather than the system.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::Validation { .. } | Error::Coercion(_))
    }
}
