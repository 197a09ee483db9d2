//! # Signature Verifiers
//!
//! A [`Verifier`] checks one family of signature schemes. The
//! [`VerifierRegistry`] holds an ordered list of them and resolves the first
//! one that supports a declared algorithm.
//!
//! The registry is constructed explicitly and passed to the verification
//! service, so tests can inject doubles and a process can hold several
//! independent registries.

pub mod ed25519;
pub mod kms;

pub use ed25519::Ed25519Verifier;
pub use kms::KmsVerifier;

use crate::config::VerificationConfig;
use crate::domain::algorithm::SignatureAlgorithm;
use crate::domain::entities::SignatureResult;
use crate::domain::errors::SignatureError;
use crate::ports::outbound::KmsClientFactory;
use std::fmt;
use std::sync::Arc;

/// The declared field a successful verification vouches for.
///
/// Trust is looked up by this identity only. Any other declared field is
/// unauthenticated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustAnchor {
    /// The signature checked out against `public_key`
    PublicKey,
    /// The key service confirmed the signature under `key_id`
    KeyId,
}

/// A signature verification strategy.
#[async_trait::async_trait]
pub trait Verifier: Send + Sync {
    /// Whether this verifier handles `algorithm`.
    fn supports(&self, algorithm: &SignatureAlgorithm) -> bool;

    /// Identity authenticated by a successful [`Verifier::verify`].
    fn trust_anchor(&self) -> TrustAnchor {
        TrustAnchor::PublicKey
    }

    /// Check `signature` over the exact `content` bytes.
    ///
    /// Any decoding, key or transport problem is a failed verification
    /// (`false`); implementations never panic or propagate errors.
    async fn verify(&self, content: &str, signature: &SignatureResult) -> bool;
}

/// Ordered collection of verifiers.
#[derive(Clone, Default)]
pub struct VerifierRegistry {
    verifiers: Vec<Arc<dyn Verifier>>,
}

impl VerifierRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Ed25519 and KMS ECDSA verifiers.
    pub fn with_builtin(factory: Arc<dyn KmsClientFactory>, config: &VerificationConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Ed25519Verifier::new()));
        registry.register(Arc::new(KmsVerifier::new(
            factory,
            config.kms_region.clone(),
            config.kms_timeout,
        )));
        registry
    }

    /// Append a verifier. Earlier registrations win on overlap.
    pub fn register(&mut self, verifier: Arc<dyn Verifier>) {
        self.verifiers.push(verifier);
    }

    /// First verifier supporting `algorithm`.
    ///
    /// # Errors
    /// `SignatureError::UnsupportedAlgorithm` if none does.
    pub fn resolve(&self, algorithm: &SignatureAlgorithm) -> Result<Arc<dyn Verifier>, SignatureError> {
        self.verifiers
            .iter()
            .find(|v| v.supports(algorithm))
            .cloned()
            .ok_or_else(|| SignatureError::UnsupportedAlgorithm(algorithm.to_string()))
    }

    pub fn has(&self, algorithm: &SignatureAlgorithm) -> bool {
        self.verifiers.iter().any(|v| v.supports(algorithm))
    }

    /// Built-in algorithms that some registered verifier handles.
    pub fn supported_algorithms(&self) -> Vec<SignatureAlgorithm> {
        SignatureAlgorithm::builtin()
            .into_iter()
            .filter(|a| self.has(a))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.verifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }

    /// Resolve and verify in one step.
    pub async fn verify(
        &self,
        content: &str,
        signature: &SignatureResult,
    ) -> Result<bool, SignatureError> {
        let verifier = self.resolve(&signature.algorithm)?;
        Ok(verifier.verify(content, signature).await)
    }
}

impl fmt::Debug for VerifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierRegistry")
            .field("verifiers", &self.verifiers.len())
            .finish()
    }
}
