//! Error types for caixa-store

use std::fmt;

use caixa_core::{ClientName, Sheet};
use thiserror::Error;

/// Result type alias for caixa-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Step of the provisioning sequence that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStep {
    /// Creating the spreadsheet
    Create,
    /// Moving it into the parent folder
    MoveToFolder,
    /// Adding one of the fixed worksheets
    AddWorksheet(Sheet),
    /// Removing the backend's placeholder worksheet
    RemovePlaceholder,
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create spreadsheet"),
            Self::MoveToFolder => write!(f, "move to parent folder"),
            Self::AddWorksheet(sheet) => write!(f, "add worksheet '{sheet}'"),
            Self::RemovePlaceholder => write!(f, "remove placeholder worksheet"),
        }
    }
}

/// Errors that can occur in caixa-store
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from caixa-core
    #[error("Core error: {0}")]
    Core(#[from] caixa_core::Error),

    /// Querying the backend for a client's spreadsheet failed
    #[error("Lookup failed for client '{client}': {source}")]
    Lookup {
        /// Client being resolved
        client: String,
        /// Underlying backend error
        #[source]
        source: Box<Error>,
    },

    /// Creating or initializing a client's spreadsheet failed
    #[error("Provisioning failed for client '{client}' at step '{step}': {source}")]
    Provisioning {
        /// Client being provisioned
        client: String,
        /// Step that failed
        step: ProvisioningStep,
        /// Underlying backend error
        #[source]
        source: Box<Error>,
    },

    /// The backend rejected or failed an operation
    #[error("Backend error during {operation}: {message}")]
    Backend {
        /// Backend operation
        operation: &'static str,
        /// What went wrong
        message: String,
    },

    /// The backend answered with a non-success HTTP status
    #[error("HTTP {status} during {operation}: {body}")]
    Status {
        /// Backend operation
        operation: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Spreadsheet or worksheet does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Could not obtain credentials for the backend
    #[error("Authentication error: {0}")]
    Auth(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error (credentials file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },
}

impl Error {
    /// Creates a backend error.
    pub fn backend<S: Into<String>>(operation: &'static str, message: S) -> Self {
        Error::Backend {
            operation,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Wraps a backend error raised while looking up a client.
    pub fn lookup(client: &ClientName, source: Error) -> Self {
        Error::Lookup {
            client: client.to_string(),
            source: Box::new(source),
        }
    }

    /// Wraps a backend error raised while provisioning a client.
    pub fn provisioning(client: &ClientName, step: ProvisioningStep, source: Error) -> Self {
        Error::Provisioning {
            client: client.to_string(),
            step,
            source: Box::new(source),
        }
    }

    /// Whether the error was caused by the request rather than the backend.
    pub fn is_user_error(&self) -> bool {
        match self {
            Error::Core(err) => err.is_user_error(),
            _ => false,
        }
    }
}
