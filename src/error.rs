//! Error types for the nessus-result client

use std::path::PathBuf;
use thiserror::Error;

/// Every failure the client can hit. None of them are recovered from: the
/// binary prints the message and exits with status 1.
#[derive(Debug, Error)]
pub enum NessusError {
    #[error("{0}")]
    Usage(String),

    #[error("Unable to connect to server: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("Login rejected by server: {0}")]
    Auth(String),

    #[error("Unexpected response from {endpoint}: {detail}")]
    Protocol { endpoint: String, detail: String },

    #[error("{}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to read input: {0}")]
    Prompt(#[source] std::io::Error),
}

impl NessusError {
    pub(crate) fn protocol(endpoint: &str, detail: impl Into<String>) -> Self {
        NessusError::Protocol {
            endpoint: endpoint.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NessusError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, NessusError>;
