// ABOUTME: Error types for CA key loading and certificate issuance using thiserror.
// ABOUTME: Separates fatal key-source errors from per-instance candidate key failures.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during CA key or certificate operations.
#[derive(Error, Debug)]
pub enum SshError {
    /// Failed to read the CA key file from disk.
    #[error("failed to read CA key from {path}: {source}")]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the CA key.
    #[error("failed to parse CA key from {path}: {source}")]
    ParseKey {
        path: PathBuf,
        #[source]
        source: ssh_key::Error,
    },

    /// The CA key is passphrase protected and cannot be used unattended.
    #[error("CA key at {path} is encrypted; an unencrypted key is required")]
    EncryptedKey { path: PathBuf },

    /// Candidate key published by an instance is not valid base64.
    #[error("could not decode candidate key: {0}")]
    DecodeCandidate(#[source] base64::DecodeError),

    /// Candidate key decoded but is not an SSH public key.
    #[error("could not parse candidate key: {0}")]
    ParseCandidate(#[source] ssh_key::Error),

    /// Certificate fields were rejected by the builder.
    #[error("failed to build certificate: {0}")]
    BuildCertificate(#[source] ssh_key::Error),

    /// Signing the certificate with the CA key failed.
    #[error("failed to sign certificate: {0}")]
    SignCertificate(#[source] ssh_key::Error),

    /// Failed to serialize the signed certificate.
    #[error("failed to encode certificate: {0}")]
    EncodeCertificate(#[source] ssh_key::Error),

    /// Validity window cannot be represented.
    #[error("invalid validity window: {0}")]
    InvalidValidity(String),
}

impl SshError {
    /// True for failures caused by what an instance published rather than by the CA.
    pub fn is_candidate_error(&self) -> bool {
        matches!(
            self,
            SshError::DecodeCandidate(_) | SshError::ParseCandidate(_)
        )
    }
}

/// Result type alias using SshError.
pub type Result<T> = std::result::Result<T, SshError>;
