//! Error types for sftp-backup.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid session state: {0}")]
    InvalidState(&'static str),

    #[error("Failed to list remote directory '{path}': {source}")]
    Enumeration {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to download '{remote}' to '{}': {source}", .local.display())]
    Transfer {
        remote: String,
        local: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Filesystem error at '{}': {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl Error {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
