//! # Signature Algorithms
//!
//! Closed set of built-in signature schemes, with an `Other` variant so that
//! additional verifiers can be registered without touching this enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire tag for Ed25519 signatures.
pub const ED25519_TAG: &str = "ed25519";

/// Wire tag for ECDSA P-256/secp256k1 over a SHA-256 digest (remote KMS).
pub const ECDSA_SHA_256_TAG: &str = "ECDSA-SHA-256";

/// A signature algorithm as declared in dossier metadata.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignatureAlgorithm {
    /// Pure Ed25519 over the raw body bytes
    Ed25519,
    /// ECDSA over the SHA-256 digest of the body, verified by a remote KMS
    EcdsaSha256,
    /// Any other tag; resolvable only if a matching verifier is registered
    Other(String),
}

impl SignatureAlgorithm {
    /// The tag as written in metadata.
    pub fn as_str(&self) -> &str {
        match self {
            SignatureAlgorithm::Ed25519 => ED25519_TAG,
            SignatureAlgorithm::EcdsaSha256 => ECDSA_SHA_256_TAG,
            SignatureAlgorithm::Other(tag) => tag,
        }
    }

    /// All built-in algorithms, in registration order.
    pub fn builtin() -> [SignatureAlgorithm; 2] {
        [SignatureAlgorithm::Ed25519, SignatureAlgorithm::EcdsaSha256]
    }
}

impl From<&str> for SignatureAlgorithm {
    fn from(tag: &str) -> Self {
        match tag {
            ED25519_TAG => SignatureAlgorithm::Ed25519,
            ECDSA_SHA_256_TAG => SignatureAlgorithm::EcdsaSha256,
            other => SignatureAlgorithm::Other(other.to_string()),
        }
    }
}

impl From<String> for SignatureAlgorithm {
    fn from(tag: String) -> Self {
        SignatureAlgorithm::from(tag.as_str())
    }
}

impl From<SignatureAlgorithm> for String {
    fn from(algorithm: SignatureAlgorithm) -> Self {
        algorithm.as_str().to_string()
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
