//! # Inbound Ports (Driving Ports / API)
//!
//! The single entry point consumed by the CLI and protocol layers.

use crate::domain::document::{Metadata, ParsedDocument};
use crate::domain::entities::{AuthenticityResult, VerificationResult};
use crate::domain::errors::DocumentError;
use crate::domain::trust::TrustStore;
use std::path::Path;

/// Dossier Verification API.
///
/// Implementations must be thread-safe (`Send + Sync`); independent calls
/// share no mutable state.
#[async_trait::async_trait]
pub trait DossierVerificationApi: Send + Sync {
    /// Verify the dossier at `document_path` against the trust file at
    /// `trusted_keys_path` (or the configured default).
    ///
    /// # Errors
    /// Only read and split failures. Cryptographic, network and trust
    /// failures are reported inside the returned result.
    async fn verify(
        &self,
        document_path: &Path,
        trusted_keys_path: Option<&Path>,
    ) -> Result<VerificationResult, DocumentError>;

    /// Verify an already split document against a loaded trust store.
    async fn verify_document(
        &self,
        dossier_file: &str,
        document: &ParsedDocument,
        trust: &TrustStore,
    ) -> VerificationResult;

    /// Resolve, verify and trust-check the declared signature over `body`.
    async fn authenticate(
        &self,
        body: &str,
        metadata: &Metadata,
        trust: &TrustStore,
    ) -> AuthenticityResult;
}
