//! Error types for caixa-cli

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for caixa-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in caixa-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from caixa-api (configuration, server)
    #[error(transparent)]
    Api(#[from] caixa_api::Error),

    /// Error from caixa-store
    #[error(transparent)]
    Store(#[from] caixa_store::Error),

    /// Error from caixa-core
    #[error(transparent)]
    Core(#[from] caixa_core::Error),

    /// Configuration command failed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// I/O error with the file involved
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Creates a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates an I/O error for `path`.
    pub fn io_with_path(source: std::io::Error, path: &Path) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
