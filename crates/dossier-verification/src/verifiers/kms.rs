//! # Remote KMS ECDSA Verification
//!
//! Handles `ECDSA-SHA-256` signatures produced by a managed key service.
//! The body is hashed locally with SHA-256 and the service is asked to
//! verify the DER signature against that digest with the key named by
//! `key_id`.
//!
//! ## Region Selection
//!
//! Taken from the key ARN (`arn:<partition>:kms:<region>:...`). Bare key ids
//! and aliases use the configured default region. One client is created per
//! region and reused for the life of the verifier.
//!
//! ## Failure Policy
//!
//! Every failure (missing key id, bad base64, credentials, network, timeout,
//! service error) yields `false`. There are no retries.

use super::{TrustAnchor, Verifier};
use crate::domain::algorithm::SignatureAlgorithm;
use crate::domain::checksum::sha256_digest;
use crate::domain::entities::SignatureResult;
use crate::domain::errors::KmsError;
use crate::ports::outbound::{KeyManagementGateway, KmsClientFactory};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Region used when none is configured and the key id carries none.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default bound on a single KMS round trip.
pub const DEFAULT_KMS_TIMEOUT: Duration = Duration::from_secs(10);

/// Extract the region from a KMS key ARN.
///
/// Returns `None` for bare key ids, aliases and non-KMS ARNs.
pub fn region_from_arn(key_id: &str) -> Option<&str> {
    let mut parts = key_id.splitn(6, ':');
    let (prefix, _partition, service, region) =
        (parts.next()?, parts.next()?, parts.next()?, parts.next()?);

    if prefix != "arn" || service != "kms" || region.is_empty() {
        return None;
    }
    Some(region)
}

/// Memoizing per-region client cache shared by the KMS verifier and signer.
pub(crate) struct RegionClients {
    factory: Arc<dyn KmsClientFactory>,
    clients: Mutex<HashMap<String, Arc<dyn KeyManagementGateway>>>,
}

impl RegionClients {
    pub(crate) fn new(factory: Arc<dyn KmsClientFactory>) -> Self {
        Self {
            factory,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn get(&self, region: &str) -> Result<Arc<dyn KeyManagementGateway>, KmsError> {
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(region) {
            return Ok(Arc::clone(client));
        }

        debug!(region, "Creating KMS client");
        let client = self.factory.client(region)?;
        clients.insert(region.to_string(), Arc::clone(&client));
        Ok(client)
    }

    pub(crate) fn cached(&self) -> usize {
        self.clients.lock().len()
    }
}

/// ECDSA-SHA-256 verifier backed by a remote key-management service.
pub struct KmsVerifier {
    clients: RegionClients,
    default_region: String,
    timeout: Duration,
}

impl KmsVerifier {
    pub fn new(
        factory: Arc<dyn KmsClientFactory>,
        default_region: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            clients: RegionClients::new(factory),
            default_region: default_region.into(),
            timeout,
        }
    }

    /// Region a request for `key_id` is sent to.
    pub fn region_for<'a>(&'a self, key_id: &'a str) -> &'a str {
        region_from_arn(key_id).unwrap_or(&self.default_region)
    }

    /// Number of region clients created so far.
    pub fn cached_clients(&self) -> usize {
        self.clients.cached()
    }

    async fn verify_remote(
        &self,
        key_id: &str,
        content: &str,
        signature: &[u8],
    ) -> Result<bool, KmsError> {
        let client = self.clients.get(self.region_for(key_id))?;
        let digest = sha256_digest(content);

        tokio::time::timeout(self.timeout, client.verify_digest(key_id, &digest, signature))
            .await
            .map_err(|_| KmsError::Timeout(self.timeout))?
    }
}

#[async_trait::async_trait]
impl Verifier for KmsVerifier {
    fn supports(&self, algorithm: &SignatureAlgorithm) -> bool {
        *algorithm == SignatureAlgorithm::EcdsaSha256
    }

    /// The declared `public_key` is never sent to the service, so only the
    /// key id is vouched for.
    fn trust_anchor(&self) -> TrustAnchor {
        TrustAnchor::KeyId
    }

    async fn verify(&self, content: &str, signature: &SignatureResult) -> bool {
        let Some(key_id) = signature.key_id.as_deref().filter(|k| !k.is_empty()) else {
            debug!("KMS signature has no key_id");
            return false;
        };

        let signature_bytes = match BASE64.decode(signature.signature.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(key_id, error = %e, "KMS signature is not valid base64");
                return false;
            }
        };

        match self.verify_remote(key_id, content, &signature_bytes).await {
            Ok(valid) => valid,
            Err(e) => {
                warn!(key_id, error = %e, "KMS verification failed");
                false
            }
        }
    }
}
