//! # AWS KMS Adapter
//!
//! [`KeyManagementGateway`] backed by the AWS SDK KMS client.
//!
//! ## Operations
//!
//! | Gateway call      | KMS API         |
//! |-------------------|-----------------|
//! | `verify_digest`   | `Verify`        |
//! | `sign_digest`     | `Sign`          |
//! | `get_public_key`  | `GetPublicKey`  |
//!
//! Sign and Verify are sent with `MessageType::Digest` and
//! `SigningAlgorithmSpec::EcdsaSha256`.
//!
//! ## Credentials
//!
//! The SDK's default provider chain (environment, shared profile, SSO, web
//! identity, container and instance metadata) unless the factory is given
//! explicit credentials. The chain is resolved on the first request, so
//! documents that never reach KMS verification need no credentials.

use crate::domain::errors::KmsError;
use crate::ports::outbound::{KeyManagementGateway, KmsClientFactory, KmsPublicKey, KmsSignature};
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_kms::config::Credentials;
use aws_sdk_kms::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::{MessageType, SigningAlgorithmSpec};
use aws_sdk_kms::Client;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

const INVALID_SIGNATURE: &str = "KMSInvalidSignatureException";

// =============================================================================
// Error Mapping
// =============================================================================

/// Service error documents become [`KmsError::Service`]; everything else
/// (credentials, connection, timeout) is a transport failure.
fn sdk_error<E, R>(err: SdkError<E, R>) -> KmsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    match err.as_service_error() {
        Some(service) => KmsError::Service {
            code: service.code().unwrap_or("UnknownError").to_string(),
            message: service.message().unwrap_or_default().to_string(),
        },
        None => KmsError::Http(DisplayErrorContext(&err).to_string()),
    }
}

/// A rejected signature is an answer, not a failure.
fn verification_outcome(result: Result<bool, KmsError>) -> Result<bool, KmsError> {
    match result {
        Err(KmsError::Service { code, .. }) if code == INVALID_SIGNATURE => Ok(false),
        other => other,
    }
}

// =============================================================================
// Client
// =============================================================================

/// KMS client for one region.
pub struct AwsKmsClient {
    region: String,
    timeout: Duration,
    endpoint: Option<String>,
    credentials: Option<Credentials>,
    client: OnceCell<Client>,
}

impl AwsKmsClient {
    pub fn new(region: impl Into<String>, timeout: Duration) -> Self {
        Self {
            region: region.into(),
            timeout,
            endpoint: None,
            credentials: None,
            client: OnceCell::new(),
        }
    }

    /// Send every request to `endpoint` (VPC endpoint, local emulator).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Use fixed credentials instead of the default provider chain.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| async {
                debug!(region = %self.region, "Loading AWS configuration for KMS");

                let mut loader = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(self.region.clone()))
                    .timeout_config(TimeoutConfig::builder().operation_timeout(self.timeout).build())
                    .retry_config(RetryConfig::standard().with_max_attempts(1));
                if let Some(endpoint) = &self.endpoint {
                    loader = loader.endpoint_url(endpoint.clone());
                }
                if let Some(credentials) = &self.credentials {
                    loader = loader.credentials_provider(credentials.clone());
                }

                Client::new(&loader.load().await)
            })
            .await
    }
}

impl fmt::Debug for AwsKmsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsKmsClient")
            .field("region", &self.region)
            .field("timeout", &self.timeout)
            .field("endpoint", &self.endpoint)
            .field("static_credentials", &self.credentials.is_some())
            .finish()
    }
}

#[async_trait::async_trait]
impl KeyManagementGateway for AwsKmsClient {
    async fn verify_digest(
        &self,
        key_id: &str,
        digest: &[u8; 32],
        signature: &[u8],
    ) -> Result<bool, KmsError> {
        let result = self
            .client()
            .await
            .verify()
            .key_id(key_id)
            .message(Blob::new(digest.to_vec()))
            .message_type(MessageType::Digest)
            .signature(Blob::new(signature.to_vec()))
            .signing_algorithm(SigningAlgorithmSpec::EcdsaSha256)
            .send()
            .await
            .map(|output| output.signature_valid())
            .map_err(sdk_error);

        verification_outcome(result)
    }

    async fn sign_digest(&self, key_id: &str, digest: &[u8; 32]) -> Result<KmsSignature, KmsError> {
        let output = self
            .client()
            .await
            .sign()
            .key_id(key_id)
            .message(Blob::new(digest.to_vec()))
            .message_type(MessageType::Digest)
            .signing_algorithm(SigningAlgorithmSpec::EcdsaSha256)
            .send()
            .await
            .map_err(sdk_error)?;

        let signature = output
            .signature()
            .ok_or_else(|| KmsError::InvalidResponse("Sign returned no signature".to_string()))?;
        Ok(KmsSignature {
            signature: signature.as_ref().to_vec(),
            key_id: output.key_id().unwrap_or(key_id).to_string(),
        })
    }

    async fn get_public_key(&self, key_id: &str) -> Result<KmsPublicKey, KmsError> {
        let output = self
            .client()
            .await
            .get_public_key()
            .key_id(key_id)
            .send()
            .await
            .map_err(sdk_error)?;

        let public_key = output
            .public_key()
            .ok_or_else(|| KmsError::InvalidResponse("GetPublicKey returned no key".to_string()))?;
        Ok(KmsPublicKey {
            public_key_der: public_key.as_ref().to_vec(),
            key_id: output.key_id().unwrap_or(key_id).to_string(),
        })
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Builds one [`AwsKmsClient`] per region.
#[derive(Clone, Debug)]
pub struct AwsKmsClientFactory {
    credentials: Option<Credentials>,
    endpoint: Option<String>,
    timeout: Duration,
}

impl AwsKmsClientFactory {
    pub fn new(timeout: Duration) -> Self {
        Self {
            credentials: None,
            endpoint: None,
            timeout,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Send every request to `endpoint` instead of the regional host.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn build(&self, region: &str) -> AwsKmsClient {
        let mut client = AwsKmsClient::new(region, self.timeout);
        if let Some(endpoint) = &self.endpoint {
            client = client.with_endpoint(endpoint.clone());
        }
        if let Some(credentials) = &self.credentials {
            client = client.with_credentials(credentials.clone());
        }
        client
    }
}

impl KmsClientFactory for AwsKmsClientFactory {
    fn client(&self, region: &str) -> Result<Arc<dyn KeyManagementGateway>, KmsError> {
        Ok(Arc::new(self.build(region)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            None,
            None,
            "test",
        )
    }

    #[test]
    fn test_invalid_signature_answer_is_false() {
        let rejected = Err(KmsError::Service {
            code: INVALID_SIGNATURE.to_string(),
            message: "bad".to_string(),
        });
        assert_eq!(verification_outcome(rejected), Ok(false));
        assert_eq!(verification_outcome(Ok(true)), Ok(true));

        let not_found = KmsError::Service {
            code: "NotFoundException".to_string(),
            message: "gone".to_string(),
        };
        assert_eq!(verification_outcome(Err(not_found.clone())), Err(not_found));
    }

    #[test]
    fn test_factory_builds_client_per_region() {
        let factory = AwsKmsClientFactory::new(Duration::from_secs(2))
            .with_endpoint("http://localhost:4566")
            .with_credentials(credentials());

        let client = factory.build("eu-west-3");
        assert_eq!(client.region(), "eu-west-3");
        assert_eq!(client.endpoint(), Some("http://localhost:4566"));
        assert!(factory.client("us-east-1").is_ok());
    }

    #[test]
    fn test_debug_omits_credentials() {
        let client = AwsKmsClient::new("us-east-1", Duration::from_secs(1)).with_credentials(credentials());
        let rendered = format!("{client:?}");

        assert!(rendered.contains("us-east-1"));
        assert!(!rendered.contains("wJalrXUtnFEMI"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = AwsKmsClient::new("us-east-1", Duration::from_millis(500))
            .with_endpoint("http://127.0.0.1:9")
            .with_credentials(credentials());

        let result = client.get_public_key("alias/k").await;
        assert!(matches!(result, Err(KmsError::Http(_))));

        let result = client.verify_digest("alias/k", &[0u8; 32], b"sig").await;
        assert!(matches!(result, Err(KmsError::Http(_))));
    }
}
