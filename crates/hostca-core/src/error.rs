// ABOUTME: Error types for the issuance pipeline.
// ABOUTME: CloudError for collaborator calls, ConfigError for startup configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by cloud collaborators (instance listing, guest attributes,
/// metadata writes, project directory lookups).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API answered with a non-success status.
    #[error("{operation} failed with status {status}: {message}")]
    Api {
        operation: String,
        status: u16,
        message: String,
    },

    /// The request never got an answer (connect error, timeout, reset).
    #[error("request failed: {0}")]
    Transport(String),

    /// The API answered with something we could not decode.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// No usable credentials.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl CloudError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }
}

/// Errors loading or validating configuration. Always fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the targets file.
    #[error("failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the targets file.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value was syntactically fine but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}
