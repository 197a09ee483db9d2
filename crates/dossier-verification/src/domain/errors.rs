//! # Verification Errors
//!
//! Error types for dossier parsing, signature verification and signing.
//!
//! Only [`DocumentError`] is fatal to a verification call. Every other error
//! is folded into a status field of the result before it reaches the caller.

use thiserror::Error;

/// Errors raised while reading or splitting a dossier.
///
/// Callers can tell "not a dossier" ([`DocumentError::MalformedDocument`])
/// apart from "corrupt dossier" ([`DocumentError::InvalidMetadataJson`]).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// The `---dossier` / JSON / `---` / body shape is absent
    #[error("Invalid dossier format. Expected:\n---dossier\n{{...}}\n---\n[body]")]
    MalformedDocument,

    /// The metadata block is present but is not valid JSON
    #[error("Failed to parse metadata JSON: {0}")]
    InvalidMetadataJson(String),

    /// The dossier file could not be read
    #[error("Failed to read dossier {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Errors from signature resolution and verification.
///
/// These never escape the verification boundary; they become an
/// `AuthenticityResult` with status `error` or `invalid`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// No registered verifier supports the declared algorithm
    #[error("No verifier registered for algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Signature or key material is not valid base64/PEM/DER
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// The declared public key is not a usable key for the algorithm
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// The remote key-management service could not be reached or failed
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Errors reported by a remote key-management service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KmsError {
    /// The call did not complete within the configured bound
    #[error("KMS request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Credential, connection or protocol failure
    #[error("KMS request failed: {0}")]
    Http(String),

    /// The service answered with an error document
    #[error("KMS service error {code}: {message}")]
    Service { code: String, message: String },

    /// The response could not be decoded
    #[error("Invalid KMS response: {0}")]
    InvalidResponse(String),
}

/// Errors from the signing side (authoring tools).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SigningError {
    /// Private key material could not be loaded
    #[error("Invalid signing key: {0}")]
    Key(String),

    /// Key file could not be read
    #[error("Failed to read key file {path}: {reason}")]
    Io { path: String, reason: String },

    /// Remote signing failed
    #[error(transparent)]
    Kms(#[from] KmsError),
}
