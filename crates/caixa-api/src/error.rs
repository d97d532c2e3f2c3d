//! Error types for caixa-api

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for caixa-api operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in caixa-api
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from caixa-core
    #[error("Core error: {0}")]
    Core(#[from] caixa_core::Error),

    /// Error from caixa-store
    #[error("Store error: {0}")]
    Store(#[from] caixa_store::Error),

    /// Request was malformed
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No route matches the path
    #[error("Not found: {0}")]
    NotFound(String),

    /// Path names no known worksheet
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// Listener could not bind or the serve loop failed
    #[error("Server error on {addr}: {source}")]
    Server {
        /// Listen address
        addr: SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
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
    /// Creates a bad request error.
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Error::BadRequest(message.into())
    }

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

    /// Status code and stable error code for the JSON API.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Core(err) if err.is_user_error() => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Error::Core(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
            Error::Store(err) if err.is_user_error() => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Error::Store(caixa_store::Error::Lookup { .. }) => (StatusCode::BAD_GATEWAY, "LOOKUP_FAILED"),
            Error::Store(caixa_store::Error::Provisioning { .. }) => {
                (StatusCode::BAD_GATEWAY, "PROVISIONING_FAILED")
            }
            Error::Store(caixa_store::Error::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::Store(_) => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Error::NotFound(_) | Error::UnknownTable(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::Config { .. } | Error::Server { .. } | Error::Io { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
            }
        }
    }

    /// Message shown to people using the pages.
    pub fn notice(&self) -> String {
        match self {
            Error::Store(caixa_store::Error::Lookup { source, .. }) => {
                format!("Erro ao carregar ou criar a planilha: {source}")
            }
            Error::Store(caixa_store::Error::Provisioning { source, .. }) => {
                format!("Erro ao criar planilha: {source}")
            }
            Error::BadRequest(message) => message.clone(),
            other => format!("Erro: {other}"),
        }
    }
}

/// JSON error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error detail
    pub error: ErrorDetail,
}

/// Code and message of a failed request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    /// Stable error code
    pub code: &'static str,
    /// Human readable message
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        } else {
            tracing::debug!(error = %self, code, "request rejected");
        }
        let body = ErrorResponse {
            error: ErrorDetail {
                code,
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use caixa_core::ClientName;
    use caixa_store::ProvisioningStep;

    fn acme() -> ClientName {
        ClientName::new("Acme").unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let validation = Error::from(caixa_core::Error::validation("bad"));
        assert_eq!(validation.status_and_code().0, StatusCode::BAD_REQUEST);

        let lookup = Error::from(caixa_store::Error::lookup(
            &acme(),
            caixa_store::Error::backend("find_containers", "timeout"),
        ));
        assert_eq!(
            lookup.status_and_code(),
            (StatusCode::BAD_GATEWAY, "LOOKUP_FAILED")
        );

        let unknown = Error::UnknownTable("planilhas".to_string());
        assert_eq!(unknown.status_and_code().0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_notice_texts() {
        let provisioning = Error::from(caixa_store::Error::provisioning(
            &acme(),
            ProvisioningStep::Create,
            caixa_store::Error::backend("create_container", "quota exceeded"),
        ));
        assert_eq!(
            provisioning.notice(),
            "Erro ao criar planilha: Backend error during create_container: quota exceeded"
        );

        let lookup = Error::from(caixa_store::Error::lookup(
            &acme(),
            caixa_store::Error::backend("find_containers", "timeout"),
        ));
        assert!(lookup.notice().starts_with("Erro ao carregar ou criar a planilha:"));
    }

    #[test]
    fn test_into_response_status() {
        let response = Error::bad_request("missing name").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
