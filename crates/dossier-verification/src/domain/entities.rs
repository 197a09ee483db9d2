//! # Domain Entities
//!
//! Result types produced by each stage of the verification pipeline, plus
//! the signature record shared by signers and verifiers.
//!
//! Every type here serializes to the JSON shape consumed by the CLI and
//! protocol layers (camelCase fields, lowercase statuses).

use super::algorithm::SignatureAlgorithm;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Signature Record
// =============================================================================

/// A detached signature over a dossier body, as stored in metadata.
///
/// Produced by a `Signer`, consumed by a `Verifier`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureResult {
    /// Algorithm tag (`ed25519`, `ECDSA-SHA-256`, ...)
    pub algorithm: SignatureAlgorithm,
    /// Base64-encoded signature bytes
    pub signature: String,
    /// Public key (PEM for Ed25519, base64 DER for KMS keys)
    #[serde(default)]
    pub public_key: String,
    /// Key identifier (KMS key ARN, or a human-readable label)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    /// Signer identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_by: Option<String>,
    /// RFC 3339 signing timestamp; informational, never verified
    #[serde(default)]
    pub signed_at: String,
}

/// Checksum declaration in metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumInfo {
    /// Always `sha256`
    pub algorithm: String,
    /// 64 lowercase hex characters
    pub hash: String,
}

// =============================================================================
// Risk
// =============================================================================

/// Declared risk level of a dossier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    /// Absent or unrecognized declaration
    Unknown,
}

impl RiskLevel {
    /// Parse a declared level. Returns `None` for anything but the four
    /// recognized levels.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            "critical" => Some(RiskLevel::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
            RiskLevel::Unknown => "unknown",
        }
    }

    /// High or critical.
    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk declarations lifted from metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
    pub destructive_operations: Vec<String>,
    pub requires_approval: bool,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self {
            risk_level: RiskLevel::Unknown,
            risk_factors: Vec::new(),
            destructive_operations: Vec::new(),
            requires_approval: true,
        }
    }
}

// =============================================================================
// Integrity
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityStatus {
    Valid,
    Invalid,
    Missing,
}

/// Outcome of the checksum comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityResult {
    pub status: IntegrityStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hash: Option<String>,
}

impl IntegrityResult {
    pub fn missing() -> Self {
        Self {
            status: IntegrityStatus::Missing,
            message: "No checksum found in dossier - cannot verify integrity".to_string(),
            expected_hash: None,
            actual_hash: None,
        }
    }
}

// =============================================================================
// Authenticity
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticityStatus {
    /// Valid signature from a key in the trust store
    Verified,
    /// Valid signature from a key not in the trust store
    SignedUnknown,
    /// No signature declared
    Unsigned,
    /// Signature declared but does not verify
    Invalid,
    /// Verification could not be carried out
    Error,
}

/// Outcome of signature verification and trust lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticityResult {
    pub status: AuthenticityStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    pub is_trusted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_as: Option<String>,
}

impl AuthenticityResult {
    pub fn unsigned() -> Self {
        Self {
            status: AuthenticityStatus::Unsigned,
            message: "No signature found - authenticity cannot be verified".to_string(),
            signer: None,
            key_id: None,
            public_key: None,
            is_trusted: false,
            trusted_as: None,
        }
    }

    /// Authenticity left unevaluated because integrity did not pass.
    pub fn not_evaluated() -> Self {
        Self {
            message: "Authenticity not evaluated - integrity could not be verified".to_string(),
            ..Self::unsigned()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AuthenticityStatus::Error,
            message: message.into(),
            ..Self::unsigned()
        }
    }
}

// =============================================================================
// Recommendation
// =============================================================================

/// Advisory verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Allow,
    Warn,
    Block,
}

impl Recommendation {
    /// Process exit code expected by callers: ALLOW 0, WARN 2, BLOCK 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Recommendation::Allow => 0,
            Recommendation::Warn => 2,
            Recommendation::Block => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Allow => "ALLOW",
            Recommendation::Warn => "WARN",
            Recommendation::Block => "BLOCK",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate result of one verification call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub dossier_file: String,
    pub integrity: IntegrityResult,
    pub authenticity: AuthenticityResult,
    pub risk_assessment: RiskAssessment,
    pub recommendation: Recommendation,
    pub message: String,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Recommendation::Allow.exit_code(), 0);
        assert_eq!(Recommendation::Warn.exit_code(), 2);
        assert_eq!(Recommendation::Block.exit_code(), 1);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&AuthenticityStatus::SignedUnknown).unwrap(),
            "\"signed_unknown\""
        );
        assert_eq!(
            serde_json::to_string(&Recommendation::Block).unwrap(),
            "\"BLOCK\""
        );
        assert_eq!(
            serde_json::to_string(&IntegrityStatus::Missing).unwrap(),
            "\"missing\""
        );
    }

    #[test]
    fn test_risk_assessment_defaults_require_approval() {
        let risk = RiskAssessment::default();
        assert_eq!(risk.risk_level, RiskLevel::Unknown);
        assert!(risk.requires_approval);
    }

    #[test]
    fn test_integrity_result_omits_absent_hashes() {
        let json = serde_json::to_value(IntegrityResult::missing()).unwrap();
        assert_eq!(json["status"], "missing");
        assert!(json.get("expectedHash").is_none());
        assert!(json.get("actualHash").is_none());
    }

    #[test]
    fn test_risk_level_parse_rejects_unknown_values() {
        assert_eq!(RiskLevel::parse("critical"), Some(RiskLevel::Critical));
        assert_eq!(RiskLevel::parse("unknown"), None);
        assert_eq!(RiskLevel::parse("HIGH"), None);
    }
}
