// ABOUTME: SSH host certificate construction for instance-published public keys.
// ABOUTME: Decodes a raw base64 key, scopes it to IP principals, and signs with the CA key.

use crate::error::{Result, SshError};
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use ssh_key::certificate::{Builder, CertType};
use ssh_key::{Certificate, HashAlg, PrivateKey, PublicKey};
use std::time::Duration;

/// Key ID stamped on every certificate this CA issues.
pub const KEY_ID: &str = "gcp-ssh-ca";

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 32;

/// A signed host certificate together with its textual encoding.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    certificate: Certificate,
    encoded: String,
}

impl IssuedCertificate {
    /// The `<type-tag> <base64>` form written into instance metadata.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn principals(&self) -> &[String] {
        self.certificate.valid_principals()
    }

    pub fn valid_after(&self) -> u64 {
        self.certificate.valid_after()
    }

    pub fn valid_before(&self) -> u64 {
        self.certificate.valid_before()
    }

    /// SHA256 fingerprint of the host key that was certified.
    pub fn host_key_fingerprint(&self) -> String {
        PublicKey::from(self.certificate.public_key().clone())
            .fingerprint(HashAlg::Sha256)
            .to_string()
    }
}

/// Decode a candidate key as published in guest attributes.
///
/// The attribute holds the base64 of the SSH wire-format public key blob,
/// without the algorithm prefix used in `authorized_keys` lines.
pub fn parse_candidate_key(candidate: &str) -> Result<PublicKey> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(candidate.trim())
        .map_err(SshError::DecodeCandidate)?;
    PublicKey::from_bytes(&bytes).map_err(SshError::ParseCandidate)
}

/// Signs host keys on behalf of the fleet.
pub struct CertificateAuthority {
    signing_key: PrivateKey,
}

impl CertificateAuthority {
    pub fn new(signing_key: PrivateKey) -> Self {
        Self { signing_key }
    }

    pub fn public_key(&self) -> &PublicKey {
        self.signing_key.public_key()
    }

    /// Sign `candidate` as a host certificate valid for `principals` from now
    /// until now + `validity`.
    ///
    /// An empty `principals` slice produces a certificate with an empty
    /// principal list; callers decide whether that is acceptable.
    ///
    /// # Errors
    /// Candidate decode/parse failures return `DecodeCandidate`/`ParseCandidate`;
    /// anything else is a CA-side failure.
    pub fn sign_host_key(
        &self,
        candidate: &str,
        principals: &[String],
        validity: Duration,
    ) -> Result<IssuedCertificate> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        self.sign_host_key_at(candidate, principals, validity, Utc::now(), &nonce)
    }

    /// Deterministic core of [`sign_host_key`](Self::sign_host_key) with an
    /// explicit issue time and nonce.
    pub fn sign_host_key_at(
        &self,
        candidate: &str,
        principals: &[String],
        validity: Duration,
        now: DateTime<Utc>,
        nonce: &[u8],
    ) -> Result<IssuedCertificate> {
        let host_key = parse_candidate_key(candidate)?;
        let (valid_after, valid_before) = validity_window(now, validity)?;

        let mut builder = Builder::new(
            nonce.to_vec(),
            host_key.key_data().clone(),
            valid_after,
            valid_before,
        )
        .map_err(SshError::BuildCertificate)?;

        builder.serial(0).map_err(SshError::BuildCertificate)?;
        builder.key_id(KEY_ID).map_err(SshError::BuildCertificate)?;
        builder
            .cert_type(CertType::Host)
            .map_err(SshError::BuildCertificate)?;

        if principals.is_empty() {
            // ssh-key refuses to sign without an explicit choice here
            builder
                .all_principals_valid()
                .map_err(SshError::BuildCertificate)?;
        }
        for principal in principals {
            builder
                .valid_principal(principal)
                .map_err(SshError::BuildCertificate)?;
        }

        let certificate = builder
            .sign(&self.signing_key)
            .map_err(SshError::SignCertificate)?;
        let encoded = certificate
            .to_openssh()
            .map_err(SshError::EncodeCertificate)?;

        Ok(IssuedCertificate {
            certificate,
            encoded,
        })
    }
}

/// `(valid_after, valid_before)` in Unix seconds for a window opening at `now`.
pub fn validity_window(now: DateTime<Utc>, validity: Duration) -> Result<(u64, u64)> {
    if validity.is_zero() {
        return Err(SshError::InvalidValidity(
            "validity must be greater than zero".to_string(),
        ));
    }
    let valid_after = u64::try_from(now.timestamp())
        .map_err(|_| SshError::InvalidValidity(format!("issue time {now} is before 1970")))?;
    let valid_before = valid_after
        .checked_add(validity.as_secs())
        .ok_or_else(|| SshError::InvalidValidity(format!("{validity:?} overflows")))?;
    Ok((valid_after, valid_before))
}

/// Validity expressed in whole days.
pub fn days(n: u32) -> Duration {
    Duration::from_secs(u64::from(n) * 24 * 60 * 60)
}
