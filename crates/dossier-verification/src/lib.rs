//! # Dossier Verification
//!
//! Decides whether a dossier (a signed instruction document handed to an
//! automation agent) may be executed: ALLOW, WARN or BLOCK.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): splitting, checksums, trust store and the
//!   recommendation engine, no network I/O
//! - **Ports Layer** (`ports/`): the verification API and the key-management
//!   gateway
//! - **Verifiers / Signers** (`verifiers/`, `signers/`): one pair per
//!   signature scheme (Ed25519, KMS ECDSA-SHA-256)
//! - **Adapters** (`adapters/`): AWS KMS through the AWS SDK and an in-process KMS
//! - **Service Layer** (`service.rs`): wires the pipeline together
//!
//! ## Security Notes
//!
//! - The checksum and the signature always cover the same body bytes.
//! - A missing checksum blocks, even when the signature is valid.
//! - Verification failures of any kind never surface as errors; they become
//!   status fields and a BLOCK.
//! - KMS calls are bounded by a timeout and never retried.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod signers;
pub mod verifiers;

// Re-export public API
pub use adapters::{AwsKmsClient, AwsKmsClientFactory};
pub use config::VerificationConfig;
pub use domain::algorithm::SignatureAlgorithm;
pub use domain::checksum::{calculate_checksum, verify_integrity};
pub use domain::document::{
    read_document, split, validate_required_fields, DocumentStatus, Metadata, ParsedDocument,
    ValidationProblem,
};
pub use domain::entities::{
    AuthenticityResult, AuthenticityStatus, ChecksumInfo, IntegrityResult, IntegrityStatus,
    Recommendation, RiskAssessment, RiskLevel, SignatureResult, VerificationResult,
};
pub use domain::errors::{DocumentError, KmsError, SignatureError, SigningError};
pub use domain::recommendation::{recommend, Assessment};
pub use domain::trust::{load_trusted_keys, TrustStore};
pub use ports::inbound::DossierVerificationApi;
pub use ports::outbound::{KeyManagementGateway, KmsClientFactory};
pub use service::DossierVerificationService;
pub use signers::{seal, Ed25519Signer, KmsSigner, Signer};
pub use verifiers::{Ed25519Verifier, KmsVerifier, TrustAnchor, Verifier, VerifierRegistry};
