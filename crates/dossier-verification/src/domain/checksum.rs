//! # Checksum Engine
//!
//! SHA-256 integrity digest of the dossier body.
//!
//! The hash covers the body only (everything after the closing delimiter),
//! never the metadata block.

use super::entities::{IntegrityResult, IntegrityStatus};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// SHA-256 digest of the body's UTF-8 bytes.
pub fn sha256_digest(body: &str) -> [u8; 32] {
    Sha256::digest(body.as_bytes()).into()
}

/// SHA-256 of the body as 64 lowercase hex characters.
pub fn calculate_checksum(body: &str) -> String {
    hex::encode(sha256_digest(body))
}

/// Compare the body's checksum against the declared one.
///
/// Comparison is exact and constant-time: a hash differing only in letter
/// case is a mismatch.
/// An absent or empty expected hash yields `missing`.
pub fn verify_integrity(body: &str, expected_hash: Option<&str>) -> IntegrityResult {
    let Some(expected) = expected_hash.filter(|h| !h.is_empty()) else {
        return IntegrityResult::missing();
    };

    let actual = calculate_checksum(body);

    if bool::from(actual.as_bytes().ct_eq(expected.as_bytes())) {
        IntegrityResult {
            status: IntegrityStatus::Valid,
            message: "Checksum matches - content has not been tampered with".to_string(),
            expected_hash: Some(expected.to_string()),
            actual_hash: Some(actual),
        }
    } else {
        IntegrityResult {
            status: IntegrityStatus::Invalid,
            message: "CHECKSUM MISMATCH - dossier has been tampered with!".to_string(),
            expected_hash: Some(expected.to_string()),
            actual_hash: Some(actual),
        }
    }
}
