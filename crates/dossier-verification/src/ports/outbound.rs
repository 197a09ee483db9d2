//! # Outbound Ports (Driven Ports / SPI)
//!
//! Remote key-management service used by the ECDSA verifier and signer.
//! All operations work in digest mode: the caller hashes the body with
//! SHA-256 and the service signs or verifies that 32-byte digest.

use crate::domain::errors::KmsError;
use std::sync::Arc;

/// Signature returned by a KMS `Sign` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KmsSignature {
    /// DER-encoded ECDSA signature
    pub signature: Vec<u8>,
    /// Fully qualified key identifier (ARN) reported by the service
    pub key_id: String,
}

/// Public key returned by a KMS `GetPublicKey` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KmsPublicKey {
    /// DER-encoded SubjectPublicKeyInfo
    pub public_key_der: Vec<u8>,
    /// Fully qualified key identifier (ARN) reported by the service
    pub key_id: String,
}

/// Gateway to a remote key-management service.
///
/// Implementations perform exactly one request per call; no retries.
#[async_trait::async_trait]
pub trait KeyManagementGateway: Send + Sync {
    /// Ask the service whether `signature` is valid for `digest` under `key_id`.
    ///
    /// # Errors
    /// Transport, timeout and service failures. A well-formed "signature is
    /// not valid" answer is `Ok(false)`, not an error.
    async fn verify_digest(
        &self,
        key_id: &str,
        digest: &[u8; 32],
        signature: &[u8],
    ) -> Result<bool, KmsError>;

    /// Sign a SHA-256 digest with `key_id`.
    async fn sign_digest(&self, key_id: &str, digest: &[u8; 32]) -> Result<KmsSignature, KmsError>;

    /// Fetch the public half of `key_id`.
    async fn get_public_key(&self, key_id: &str) -> Result<KmsPublicKey, KmsError>;
}

/// Creates gateway handles for a region.
///
/// Callers memoize the returned handle per region.
pub trait KmsClientFactory: Send + Sync {
    fn client(&self, region: &str) -> Result<Arc<dyn KeyManagementGateway>, KmsError>;
}
