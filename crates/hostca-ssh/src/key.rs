// ABOUTME: CA signing key loading from the filesystem.
// ABOUTME: Parses an OpenSSH private key and rejects keys that need a passphrase.

use crate::error::{Result, SshError};
use ssh_key::{HashAlg, PrivateKey};
use std::path::Path;

/// Load the CA private key from disk.
///
/// The key must be in OpenSSH format and unencrypted: the issuer runs
/// unattended and has nowhere to get a passphrase from.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or is encrypted.
pub fn load_ca_key(key_path: &Path) -> Result<PrivateKey> {
    let key_data = std::fs::read_to_string(key_path).map_err(|e| SshError::ReadKey {
        path: key_path.to_path_buf(),
        source: e,
    })?;

    let key = PrivateKey::from_openssh(&key_data).map_err(|e| SshError::ParseKey {
        path: key_path.to_path_buf(),
        source: e,
    })?;

    if key.is_encrypted() {
        return Err(SshError::EncryptedKey {
            path: key_path.to_path_buf(),
        });
    }

    Ok(key)
}

/// SHA256 fingerprint of the CA public key, as printed by `ssh-keygen -l`.
pub fn ca_fingerprint(key: &PrivateKey) -> String {
    key.public_key().fingerprint(HashAlg::Sha256).to_string()
}
