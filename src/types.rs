use std::fmt;

use thiserror::Error;

use crate::argocd_client::ValidationReport;

/// Coarse classification of a [`StatusError`], stable for callers that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    RemoteStatus,
    Validation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Transport => "TransportError",
            ErrorKind::RemoteStatus => "RemoteStatusError",
            ErrorKind::Validation => "ValidationError",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error)]
pub enum StatusError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned {status} {status_text}")]
    RemoteStatus {
        url: String,
        status: u16,
        status_text: String,
    },

    #[error("Invalid response: {0}")]
    Validation(ValidationReport),
}

impl StatusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StatusError::Configuration(_) => ErrorKind::Configuration,
            StatusError::Transport { .. } => ErrorKind::Transport,
            StatusError::RemoteStatus { .. } => ErrorKind::RemoteStatus,
            StatusError::Validation(_) => ErrorKind::Validation,
        }
    }
}

pub type Result<T> = std::result::Result<T, StatusError>;
