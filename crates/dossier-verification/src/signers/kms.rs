//! ECDSA-SHA-256 signing with a key held in a remote key-management service.
//!
//! The body is hashed locally; only the 32-byte digest is sent. The returned
//! signature record carries the DER signature, the SPKI public key (both
//! base64) and the fully qualified key ARN reported by the service.

use super::{signing_timestamp, Signer};
use crate::domain::algorithm::SignatureAlgorithm;
use crate::domain::checksum::sha256_digest;
use crate::domain::entities::SignatureResult;
use crate::domain::errors::{KmsError, SigningError};
use crate::ports::outbound::{KeyManagementGateway, KmsClientFactory};
use crate::verifiers::kms::region_from_arn;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Signer backed by a KMS asymmetric key.
pub struct KmsSigner {
    key_id: String,
    gateway: Arc<dyn KeyManagementGateway>,
    timeout: Duration,
    signed_by: Option<String>,
}

impl KmsSigner {
    pub fn new(
        key_id: impl Into<String>,
        gateway: Arc<dyn KeyManagementGateway>,
        timeout: Duration,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            gateway,
            timeout,
            signed_by: None,
        }
    }

    /// Build a signer whose client targets the region in `key_id`'s ARN,
    /// or `default_region` for bare ids and aliases.
    pub fn from_factory(
        key_id: impl Into<String>,
        factory: &dyn KmsClientFactory,
        default_region: &str,
        timeout: Duration,
    ) -> Result<Self, SigningError> {
        let key_id = key_id.into();
        let region = region_from_arn(&key_id).unwrap_or(default_region);
        let gateway = factory.client(region)?;
        Ok(Self::new(key_id, gateway, timeout))
    }

    /// Signer identity recorded with each signature.
    pub fn with_signed_by(mut self, signed_by: impl Into<String>) -> Self {
        self.signed_by = Some(signed_by.into());
        self
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, KmsError>> + Send,
    ) -> Result<T, KmsError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| KmsError::Timeout(self.timeout))?
    }
}

#[async_trait::async_trait]
impl Signer for KmsSigner {
    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::EcdsaSha256
    }

    async fn sign(&self, content: &str) -> Result<SignatureResult, SigningError> {
        let digest = sha256_digest(content);
        debug!(key_id = %self.key_id, digest = %hex::encode(digest), "Signing digest with KMS");

        let signed = self
            .bounded(self.gateway.sign_digest(&self.key_id, &digest))
            .await?;
        if signed.signature.is_empty() {
            return Err(KmsError::InvalidResponse("no signature returned".to_string()).into());
        }

        let public_key = self
            .bounded(self.gateway.get_public_key(&self.key_id))
            .await?;
        if public_key.public_key_der.is_empty() {
            return Err(KmsError::InvalidResponse("no public key returned".to_string()).into());
        }

        let key_arn = if public_key.key_id.is_empty() {
            self.key_id.clone()
        } else {
            public_key.key_id
        };

        Ok(SignatureResult {
            algorithm: self.algorithm(),
            signature: BASE64.encode(&signed.signature),
            public_key: BASE64.encode(&public_key.public_key_der),
            key_id: Some(key_arn),
            signed_by: self.signed_by.clone(),
            signed_at: signing_timestamp(),
        })
    }

    async fn public_key(&self) -> Result<String, SigningError> {
        let public_key = self
            .bounded(self.gateway.get_public_key(&self.key_id))
            .await?;
        Ok(BASE64.encode(public_key.public_key_der))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local_kms::LocalKms;
    use crate::verifiers::kms::DEFAULT_KMS_TIMEOUT;

    #[tokio::test]
    async fn test_signature_record_carries_full_arn() {
        let kms = LocalKms::new();
        let arn = kms.create_key("eu-central-1");
        let bare_id = arn.rsplit('/').next().unwrap().to_string();

        let signer = KmsSigner::new(bare_id, Arc::new(kms.clone()), DEFAULT_KMS_TIMEOUT)
            .with_signed_by("release-bot");
        let signature = signer.sign("body").await.unwrap();

        assert_eq!(signature.algorithm, SignatureAlgorithm::EcdsaSha256);
        assert_eq!(signature.key_id.as_deref(), Some(arn.as_str()));
        assert_eq!(signature.signed_by.as_deref(), Some("release-bot"));
        assert_eq!(signature.public_key, signer.public_key().await.unwrap());
        assert!(BASE64.decode(&signature.signature).is_ok());
    }

    #[tokio::test]
    async fn test_from_factory_uses_arn_region() {
        let kms = LocalKms::new();
        let arn = kms.create_key("ap-northeast-1");

        let signer = KmsSigner::from_factory(&arn, &kms, "us-east-1", DEFAULT_KMS_TIMEOUT).unwrap();
        assert_eq!(signer.key_id(), arn);
        assert_eq!(kms.regions_requested(), vec!["ap-northeast-1".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_key_is_a_service_error() {
        let kms = LocalKms::new();
        let signer = KmsSigner::new("alias/missing", Arc::new(kms), DEFAULT_KMS_TIMEOUT);

        let err = signer.sign("body").await.unwrap_err();
        assert!(matches!(
            err,
            SigningError::Kms(KmsError::Service { ref code, .. }) if code == "NotFoundException"
        ));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let kms = LocalKms::new();
        let arn = kms.create_key("us-east-1");
        kms.set_latency(Duration::from_millis(200));

        let signer = KmsSigner::new(arn, Arc::new(kms), Duration::from_millis(10));
        assert_eq!(
            signer.sign("body").await.unwrap_err(),
            SigningError::Kms(KmsError::Timeout(Duration::from_millis(10)))
        );
    }
}
