//! # Dossier Verification Service
//!
//! Application service that implements the `DossierVerificationApi` trait.
//!
//! ## Pipeline
//!
//! ```text
//! read → split → checksum → authenticate (registry + trust store) → recommend
//! ```
//!
//! Only reading and splitting can fail. Every later problem is recorded in
//! the returned [`VerificationResult`].
//!
//! ## Concurrency
//!
//! The service holds no per-call state. `verify` loads the trust store fresh
//! on each call; callers that want to reuse a store load it once and call
//! `verify_document` with it.

use crate::adapters::aws_kms::AwsKmsClientFactory;
use crate::config::VerificationConfig;
use crate::domain::checksum::verify_integrity;
use crate::domain::document::{read_document, Metadata, ParsedDocument};
use crate::domain::entities::{
    AuthenticityResult, AuthenticityStatus, IntegrityStatus, Recommendation, RiskAssessment,
    VerificationResult,
};
use crate::domain::errors::DocumentError;
use crate::domain::recommendation::recommend;
use crate::domain::trust::{load_trusted_keys, TrustStore};
use crate::ports::inbound::DossierVerificationApi;
use crate::verifiers::{TrustAnchor, VerifierRegistry};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dossier Verification Service.
///
/// Pairs a [`VerifierRegistry`] with the runtime configuration.
#[derive(Debug, Clone)]
pub struct DossierVerificationService {
    registry: VerifierRegistry,
    config: VerificationConfig,
}

impl DossierVerificationService {
    pub fn new(registry: VerifierRegistry, config: VerificationConfig) -> Self {
        Self { registry, config }
    }

    /// Service with the built-in verifiers and the AWS KMS adapter.
    pub fn with_defaults(config: VerificationConfig) -> Self {
        let factory = Arc::new(AwsKmsClientFactory::new(config.kms_timeout));
        let registry = VerifierRegistry::with_builtin(factory, &config);
        Self::new(registry, config)
    }

    pub fn registry(&self) -> &VerifierRegistry {
        &self.registry
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Load the trust store named by `path`, the configured path, or the
    /// per-user default, in that order.
    pub fn load_trust_store(&self, path: Option<&Path>) -> TrustStore {
        match path {
            Some(path) => load_trusted_keys(Some(path)),
            None => load_trusted_keys(self.config.trusted_keys_path.as_deref()),
        }
    }
}

#[async_trait::async_trait]
impl DossierVerificationApi for DossierVerificationService {
    async fn verify(
        &self,
        document_path: &Path,
        trusted_keys_path: Option<&Path>,
    ) -> Result<VerificationResult, DocumentError> {
        let document = read_document(document_path)?;
        let trust = self.load_trust_store(trusted_keys_path);
        let dossier_file = document_path.display().to_string();

        Ok(self.verify_document(&dossier_file, &document, &trust).await)
    }

    async fn verify_document(
        &self,
        dossier_file: &str,
        document: &ParsedDocument,
        trust: &TrustStore,
    ) -> VerificationResult {
        let metadata = document.metadata();
        let body = document.body();

        // 1. Integrity
        let integrity = verify_integrity(body, metadata.checksum_hash());

        // 2. Authenticity, only over a body whose integrity holds
        let authenticity = match integrity.status {
            IntegrityStatus::Missing => AuthenticityResult::not_evaluated(),
            IntegrityStatus::Invalid => {
                AuthenticityResult::error("Cannot verify signature - integrity check failed")
            }
            IntegrityStatus::Valid => self.authenticate(body, metadata, trust).await,
        };

        // 3. Recommendation
        let declared_risk = metadata.risk_assessment();
        let assessment = recommend(&integrity, &authenticity, &declared_risk);

        // A blocked dossier never reports its declared risk.
        let risk_assessment = if assessment.recommendation == Recommendation::Block {
            RiskAssessment::default()
        } else {
            declared_risk
        };

        info!(
            dossier_file,
            recommendation = %assessment.recommendation,
            integrity = ?integrity.status,
            authenticity = ?authenticity.status,
            risk_level = %risk_assessment.risk_level,
            "Dossier verified"
        );

        VerificationResult {
            dossier_file: dossier_file.to_string(),
            integrity,
            authenticity,
            risk_assessment,
            recommendation: assessment.recommendation,
            message: assessment.message,
            errors: assessment.errors,
        }
    }

    async fn authenticate(
        &self,
        body: &str,
        metadata: &Metadata,
        trust: &TrustStore,
    ) -> AuthenticityResult {
        let Some(signature) = metadata.signature.as_ref() else {
            if let Some(problem) = metadata.signature_problem() {
                warn!(error = %problem, "Unreadable signature block");
                return AuthenticityResult::error(format!(
                    "Verification error: malformed signature block: {problem}"
                ));
            }
            return AuthenticityResult::unsigned();
        };

        let declared = AuthenticityResult {
            signer: signature.signed_by.clone(),
            key_id: signature.key_id.clone(),
            public_key: Some(signature.public_key.clone()).filter(|k| !k.is_empty()),
            ..AuthenticityResult::unsigned()
        };

        let verifier = match self.registry.resolve(&signature.algorithm) {
            Ok(verifier) => verifier,
            Err(e) => {
                warn!(algorithm = %signature.algorithm, "No verifier for signature algorithm");
                return AuthenticityResult {
                    status: AuthenticityStatus::Error,
                    message: format!("Verification error: {e}"),
                    ..declared
                };
            }
        };

        if !verifier.verify(body, signature).await {
            warn!(
                algorithm = %signature.algorithm,
                key_id = signature.key_id.as_deref().unwrap_or("-"),
                "Signature verification failed"
            );
            return AuthenticityResult {
                status: AuthenticityStatus::Invalid,
                message: "SIGNATURE VERIFICATION FAILED".to_string(),
                ..declared
            };
        }

        // Only the identity the verifier vouched for can earn trust.
        let trusted = match verifier.trust_anchor() {
            TrustAnchor::PublicKey => trust.lookup_public_key(&signature.public_key),
            TrustAnchor::KeyId => signature
                .key_id
                .as_deref()
                .and_then(|key_id| trust.lookup_key_id(key_id)),
        };

        match trusted {
            Some(label) => {
                debug!(trusted_as = label, "Signature from trusted key");
                AuthenticityResult {
                    status: AuthenticityStatus::Verified,
                    message: format!("Verified signature from trusted source: {label}"),
                    is_trusted: true,
                    trusted_as: Some(label.to_string()),
                    ..declared
                }
            }
            None => AuthenticityResult {
                status: AuthenticityStatus::SignedUnknown,
                message: "Valid signature but key is not in trusted list".to_string(),
                ..declared
            },
        }
    }
}
