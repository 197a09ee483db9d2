//! # Signers
//!
//! Authoring-side counterparts of the verifiers. A signer produces a
//! [`SignatureResult`] over the exact body bytes that a verifier will later
//! check; [`seal`] attaches that signature and a fresh checksum to a
//! document's metadata.

pub mod ed25519;
pub mod kms;

pub use ed25519::Ed25519Signer;
pub use kms::KmsSigner;

use crate::domain::algorithm::SignatureAlgorithm;
use crate::domain::checksum::calculate_checksum;
use crate::domain::document::{Metadata, ParsedDocument};
use crate::domain::entities::SignatureResult;
use crate::domain::errors::SigningError;
use chrono::{SecondsFormat, Utc};
use tracing::info;

/// A signature scheme with access to private key material.
#[async_trait::async_trait]
pub trait Signer: Send + Sync {
    /// Algorithm tag written into the signature record.
    fn algorithm(&self) -> SignatureAlgorithm;

    /// Sign the exact UTF-8 bytes of `content`.
    async fn sign(&self, content: &str) -> Result<SignatureResult, SigningError>;

    /// Public key in the encoding the matching verifier expects.
    async fn public_key(&self) -> Result<String, SigningError>;
}

/// Checksum and sign `document`'s body.
///
/// Returns new metadata carrying both; the document itself is untouched.
/// Render it with `ParsedDocument::render(&metadata, document.body())`.
pub async fn seal(document: &ParsedDocument, signer: &dyn Signer) -> Result<Metadata, SigningError> {
    let body = document.body();
    let checksum = calculate_checksum(body);
    let signature = signer.sign(body).await?;

    info!(
        algorithm = %signature.algorithm,
        key_id = signature.key_id.as_deref().unwrap_or("-"),
        checksum = %checksum,
        "Sealed dossier"
    );

    Ok(document
        .metadata()
        .with_checksum(checksum)
        .with_signature(signature))
}

/// Current time as RFC 3339 UTC with millisecond precision.
pub(crate) fn signing_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checksum::verify_integrity;
    use crate::domain::document::split;
    use crate::domain::entities::IntegrityStatus;
    use crate::verifiers::{Ed25519Verifier, Verifier};
    use ed25519_dalek::SigningKey;

    const DRAFT: &str = "---dossier\n{\n  \"title\": \"Rotate credentials\",\n  \"owner\": \"ops\"\n}\n---\n\n# Rotate\n\nSteps.\n";

    #[tokio::test]
    async fn test_seal_adds_checksum_and_signature() {
        let document = split(DRAFT).unwrap();
        let signer = Ed25519Signer::from_signing_key(SigningKey::from_bytes(&[1u8; 32]))
            .with_key_id("ops-2024");

        let sealed = seal(&document, &signer).await.unwrap();

        assert_eq!(
            verify_integrity(document.body(), sealed.checksum_hash()).status,
            IntegrityStatus::Valid
        );
        let signature = sealed.signature.clone().unwrap();
        assert_eq!(signature.key_id.as_deref(), Some("ops-2024"));
        assert!(Ed25519Verifier::new().verify(document.body(), &signature).await);

        // Unrecognized fields survive.
        assert_eq!(sealed.extra.get("owner"), document.metadata().extra.get("owner"));
        assert!(document.metadata().signature.is_none());
    }

    #[tokio::test]
    async fn test_sealed_document_re_splits_to_same_body() {
        let document = split(DRAFT).unwrap();
        let signer = Ed25519Signer::from_signing_key(SigningKey::from_bytes(&[2u8; 32]));

        let sealed = seal(&document, &signer).await.unwrap();
        let rendered = ParsedDocument::render(&sealed, document.body()).unwrap();
        let reparsed = split(&rendered).unwrap();

        assert_eq!(reparsed.body(), document.body());
        assert_eq!(reparsed.metadata(), &sealed);
    }

    #[test]
    fn test_signing_timestamp_shape() {
        let ts = signing_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        // yyyy-mm-ddThh:mm:ss.mmmZ
        assert_eq!(ts.len(), 24);
    }
}
