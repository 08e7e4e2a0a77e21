// ABOUTME: SSH primitives for hostca: CA key loading and host certificate issuance.
// ABOUTME: Wraps the ssh-key crate behind a small, instance-oriented API.

pub mod cert;
pub mod error;
pub mod key;

pub use cert::{
    days, parse_candidate_key, validity_window, CertificateAuthority, IssuedCertificate, KEY_ID,
    NONCE_LEN,
};
pub use error::{Result, SshError};
pub use key::{ca_fingerprint, load_ca_key};

// Re-export for callers that need key types without depending on ssh-key directly
pub use ssh_key;
