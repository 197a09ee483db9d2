//! # Ed25519 Verification
//!
//! Pure Ed25519 (no prehash) over the raw UTF-8 body bytes.
//!
//! ## Key Encodings
//!
//! - PEM SubjectPublicKeyInfo (`-----BEGIN PUBLIC KEY-----`), as written by
//!   the signer
//! - base64 of the SPKI DER
//! - base64 of the raw 32-byte key

use super::Verifier;
use crate::domain::algorithm::SignatureAlgorithm;
use crate::domain::entities::SignatureResult;
use crate::domain::errors::SignatureError;
use crate::domain::trust::compact_public_key;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::pkcs8::DecodePublicKey;
use ed25519_dalek::{Signature, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use tracing::debug;

/// Ed25519 signature verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Verifier for Ed25519Verifier {
    fn supports(&self, algorithm: &SignatureAlgorithm) -> bool {
        *algorithm == SignatureAlgorithm::Ed25519
    }

    async fn verify(&self, content: &str, signature: &SignatureResult) -> bool {
        match verify_detached(content, &signature.signature, &signature.public_key) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Ed25519 verification failed");
                false
            }
        }
    }
}

/// Verify a base64 Ed25519 signature over `content` with `public_key`.
///
/// # Errors
/// * `InvalidPublicKey` / `InvalidEncoding` - key or signature unusable
/// * `InvalidEncoding("signature mismatch")` - well-formed but wrong
pub fn verify_detached(
    content: &str,
    signature_b64: &str,
    public_key: &str,
) -> Result<(), SignatureError> {
    let verifying_key = parse_public_key(public_key)?;
    let signature = decode_signature(signature_b64)?;

    verifying_key
        .verify_strict(content.as_bytes(), &signature)
        .map_err(|_| SignatureError::InvalidEncoding("signature mismatch".to_string()))
}

/// Decode an Ed25519 public key from PEM or base64.
pub fn parse_public_key(encoded: &str) -> Result<VerifyingKey, SignatureError> {
    let trimmed = encoded.trim();

    if trimmed.starts_with("-----BEGIN") {
        return VerifyingKey::from_public_key_pem(trimmed)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()));
    }

    let bytes = BASE64
        .decode(compact_public_key(trimmed))
        .map_err(|e| SignatureError::InvalidEncoding(format!("public key: {e}")))?;

    match <[u8; PUBLIC_KEY_LENGTH]>::try_from(bytes.as_slice()) {
        Ok(raw) => VerifyingKey::from_bytes(&raw)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string())),
        Err(_) => VerifyingKey::from_public_key_der(&bytes)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string())),
    }
}

fn decode_signature(signature_b64: &str) -> Result<Signature, SignatureError> {
    let bytes = BASE64
        .decode(signature_b64.trim())
        .map_err(|e| SignatureError::InvalidEncoding(format!("signature: {e}")))?;

    let raw = <[u8; SIGNATURE_LENGTH]>::try_from(bytes.as_slice()).map_err(|_| {
        SignatureError::InvalidEncoding(format!(
            "signature must be {SIGNATURE_LENGTH} bytes, got {}",
            bytes.len()
        ))
    })?;

    Ok(Signature::from_bytes(&raw))
}
