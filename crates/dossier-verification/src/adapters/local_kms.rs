//! # In-Process Key Management
//!
//! A [`KeyManagementGateway`] that keeps secp256k1 keys in memory and signs
//! SHA-256 digests the way a managed service does for
//! `ECC_SECG_P256K1` / `ECDSA_SHA_256` keys: DER signatures and DER SPKI
//! public keys. Key ids are ARN-shaped and carry the region they were
//! created in.
//!
//! Used for offline development and tests. Cloning shares the key store.

use crate::domain::errors::KmsError;
use crate::ports::outbound::{KeyManagementGateway, KmsClientFactory, KmsPublicKey, KmsSignature};
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::pkcs8::EncodePublicKey;
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Account id used in generated ARNs.
pub const LOCAL_ACCOUNT_ID: &str = "000000000000";

#[derive(Default)]
struct LocalKmsState {
    keys: RwLock<HashMap<String, SigningKey>>,
    regions: RwLock<Vec<String>>,
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
    requests: AtomicUsize,
}

/// In-memory key-management service.
#[derive(Clone, Default)]
pub struct LocalKms {
    state: Arc<LocalKmsState>,
}

impl LocalKms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a key in `region` and return its ARN.
    pub fn create_key(&self, region: &str) -> String {
        self.import_key(region, SigningKey::random(&mut OsRng))
    }

    /// Register an existing key in `region` and return its ARN.
    pub fn import_key(&self, region: &str, key: SigningKey) -> String {
        let mut id = [0u8; 16];
        OsRng.fill_bytes(&mut id);
        let arn = format!(
            "arn:aws:kms:{region}:{LOCAL_ACCOUNT_ID}:key/{}",
            hex::encode(id)
        );

        self.state.keys.write().insert(arn.clone(), key);
        debug!(key_id = %arn, "Created local KMS key");
        arn
    }

    /// Simulate an outage: every call fails with a transport error.
    pub fn set_available(&self, available: bool) {
        self.state.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.state.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Gateway calls served so far.
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Regions for which a client was requested, in order.
    pub fn regions_requested(&self) -> Vec<String> {
        self.state.regions.read().clone()
    }

    pub fn clients_created(&self) -> usize {
        self.state.regions.read().len()
    }

    /// Resolve a full ARN, a bare key id or the key part of an ARN.
    fn find_key(&self, key_id: &str) -> Result<(String, SigningKey), KmsError> {
        let keys = self.state.keys.read();
        keys.iter()
            .find(|(arn, _)| {
                arn.as_str() == key_id || arn.rsplit('/').next() == Some(key_id)
            })
            .map(|(arn, key)| (arn.clone(), key.clone()))
            .ok_or_else(|| KmsError::Service {
                code: "NotFoundException".to_string(),
                message: format!("Key '{key_id}' does not exist"),
            })
    }

    async fn begin_request(&self) -> Result<(), KmsError> {
        self.state.requests.fetch_add(1, Ordering::SeqCst);

        let latency = self.state.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.state.unavailable.load(Ordering::SeqCst) {
            return Err(KmsError::Http("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyManagementGateway for LocalKms {
    async fn verify_digest(
        &self,
        key_id: &str,
        digest: &[u8; 32],
        signature: &[u8],
    ) -> Result<bool, KmsError> {
        self.begin_request().await?;
        let (_, key) = self.find_key(key_id)?;

        let Ok(signature) = Signature::from_der(signature) else {
            return Ok(false);
        };
        let verifying_key: &VerifyingKey = key.verifying_key();
        Ok(verifying_key.verify_prehash(digest, &signature).is_ok())
    }

    async fn sign_digest(&self, key_id: &str, digest: &[u8; 32]) -> Result<KmsSignature, KmsError> {
        self.begin_request().await?;
        let (arn, key) = self.find_key(key_id)?;

        let signature: Signature = key.sign_prehash(digest).map_err(|e| KmsError::Service {
            code: "KMSInternalException".to_string(),
            message: e.to_string(),
        })?;

        Ok(KmsSignature {
            signature: signature.to_der().as_bytes().to_vec(),
            key_id: arn,
        })
    }

    async fn get_public_key(&self, key_id: &str) -> Result<KmsPublicKey, KmsError> {
        self.begin_request().await?;
        let (arn, key) = self.find_key(key_id)?;

        let der = key
            .verifying_key()
            .to_public_key_der()
            .map_err(|e| KmsError::InvalidResponse(e.to_string()))?;

        Ok(KmsPublicKey {
            public_key_der: der.as_bytes().to_vec(),
            key_id: arn,
        })
    }
}

impl KmsClientFactory for LocalKms {
    fn client(&self, region: &str) -> Result<Arc<dyn KeyManagementGateway>, KmsError> {
        self.state.regions.write().push(region.to_string());
        Ok(Arc::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checksum::sha256_digest;

    #[tokio::test]
    async fn test_sign_and_verify_digest() {
        let kms = LocalKms::new();
        let arn = kms.create_key("us-east-1");
        let digest = sha256_digest("payload");

        let signed = kms.sign_digest(&arn, &digest).await.unwrap();
        assert_eq!(signed.key_id, arn);
        assert!(kms.verify_digest(&arn, &digest, &signed.signature).await.unwrap());

        let other = sha256_digest("other");
        assert!(!kms.verify_digest(&arn, &other, &signed.signature).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_der_signature_is_invalid_not_error() {
        let kms = LocalKms::new();
        let arn = kms.create_key("us-east-1");

        let result = kms.verify_digest(&arn, &[0u8; 32], b"garbage").await;
        assert_eq!(result, Ok(false));
    }

    #[tokio::test]
    async fn test_bare_key_id_resolves() {
        let kms = LocalKms::new();
        let arn = kms.create_key("eu-west-1");
        let bare = arn.rsplit('/').next().unwrap();

        let public = kms.get_public_key(bare).await.unwrap();
        assert_eq!(public.key_id, arn);
        assert!(!public.public_key_der.is_empty());
    }

    #[tokio::test]
    async fn test_outage_is_transport_error() {
        let kms = LocalKms::new();
        let arn = kms.create_key("us-east-1");
        kms.set_available(false);

        assert!(matches!(
            kms.sign_digest(&arn, &[1u8; 32]).await,
            Err(KmsError::Http(_))
        ));
        assert_eq!(kms.requests(), 1);
    }

    #[test]
    fn test_arn_shape() {
        let arn = LocalKms::new().create_key("sa-east-1");
        assert!(arn.starts_with("arn:aws:kms:sa-east-1:000000000000:key/"));
    }
}
