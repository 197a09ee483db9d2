//! # Recommendation Engine
//!
//! Fuses integrity, authenticity and declared risk into ALLOW/WARN/BLOCK.
//!
//! ## Precedence (first match wins)
//!
//! | # | Condition                                        | Verdict |
//! |---|--------------------------------------------------|---------|
//! | 1 | integrity missing                                | BLOCK   |
//! | 2 | integrity invalid                                | BLOCK   |
//! | 3 | authenticity error                               | BLOCK   |
//! | 4 | authenticity invalid                             | BLOCK   |
//! | 5 | verified and risk low                            | ALLOW   |
//! | 6 | unsigned, signed_unknown, or risk high/critical  | WARN    |
//! | 7 | anything else                                    | WARN    |
//!
//! A pure function of its three inputs; it inspects only the statuses and
//! the risk level.

use super::entities::{
    AuthenticityResult, AuthenticityStatus, IntegrityResult, IntegrityStatus, Recommendation,
    RiskAssessment, RiskLevel,
};

/// Verdict with its human-readable reason and error lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assessment {
    pub recommendation: Recommendation,
    pub message: String,
    pub errors: Vec<String>,
}

impl Assessment {
    fn block(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            recommendation: Recommendation::Block,
            message: message.into(),
            errors: vec![error.into()],
        }
    }

    fn warn(message: String) -> Self {
        Self {
            recommendation: Recommendation::Warn,
            message,
            errors: Vec::new(),
        }
    }
}

/// Decide the recommendation.
pub fn recommend(
    integrity: &IntegrityResult,
    authenticity: &AuthenticityResult,
    risk: &RiskAssessment,
) -> Assessment {
    match integrity.status {
        IntegrityStatus::Missing => {
            return Assessment::block(
                "DO NOT EXECUTE - No checksum found, cannot verify integrity",
                "Missing checksum - cannot verify integrity",
            );
        }
        IntegrityStatus::Invalid => {
            return Assessment::block(
                "DO NOT EXECUTE - Checksum mismatch, dossier has been tampered with!",
                "Checksum verification FAILED - do not execute!",
            );
        }
        IntegrityStatus::Valid => {}
    }

    match authenticity.status {
        AuthenticityStatus::Error => Assessment::block(
            format!(
                "DO NOT EXECUTE - Signature could not be verified: {}",
                authenticity.message
            ),
            format!("Signature verification error: {}", authenticity.message),
        ),
        AuthenticityStatus::Invalid => Assessment::block(
            "DO NOT EXECUTE - Invalid signature!",
            "Signature verification FAILED - do not execute!",
        ),
        AuthenticityStatus::Verified if risk.risk_level == RiskLevel::Low => Assessment {
            recommendation: Recommendation::Allow,
            message: "Verified dossier from trusted source with low risk. Safe to execute."
                .to_string(),
            errors: Vec::new(),
        },
        status => {
            let mut reasons = Vec::new();
            match status {
                AuthenticityStatus::Unsigned => {
                    reasons.push("Dossier is not signed (cannot verify author)".to_string());
                }
                AuthenticityStatus::SignedUnknown => {
                    reasons.push(
                        "Signature is valid but signer is not in your trusted keys list"
                            .to_string(),
                    );
                }
                _ => {}
            }
            if risk.risk_level.is_elevated() {
                reasons.push(format!("High risk level: {}", risk.risk_level));
            }

            if reasons.is_empty() {
                Assessment::warn(format!(
                    "Verified dossier with {} risk. Review before execution.",
                    risk.risk_level
                ))
            } else {
                Assessment::warn(format!(
                    "WARNING: {}. Review before execution.",
                    reasons.join(". ")
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTEGRITY: [IntegrityStatus; 3] = [
        IntegrityStatus::Valid,
        IntegrityStatus::Invalid,
        IntegrityStatus::Missing,
    ];

    const AUTHENTICITY: [AuthenticityStatus; 5] = [
        AuthenticityStatus::Verified,
        AuthenticityStatus::SignedUnknown,
        AuthenticityStatus::Unsigned,
        AuthenticityStatus::Invalid,
        AuthenticityStatus::Error,
    ];

    const RISK: [RiskLevel; 5] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
        RiskLevel::Unknown,
    ];

    fn integrity(status: IntegrityStatus) -> IntegrityResult {
        IntegrityResult {
            status,
            message: String::new(),
            expected_hash: None,
            actual_hash: None,
        }
    }

    fn authenticity(status: AuthenticityStatus) -> AuthenticityResult {
        AuthenticityResult {
            status,
            ..AuthenticityResult::unsigned()
        }
    }

    fn risk(level: RiskLevel) -> RiskAssessment {
        RiskAssessment {
            risk_level: level,
            ..Default::default()
        }
    }

    fn decide(i: IntegrityStatus, a: AuthenticityStatus, r: RiskLevel) -> Assessment {
        recommend(&integrity(i), &authenticity(a), &risk(r))
    }

    #[test]
    fn test_every_combination_has_a_reasoned_verdict() {
        for i in INTEGRITY {
            for a in AUTHENTICITY {
                for r in RISK {
                    let assessment = decide(i, a, r);
                    assert!(!assessment.message.is_empty(), "{i:?}/{a:?}/{r:?}");
                    if assessment.recommendation == Recommendation::Block {
                        assert!(assessment.message.starts_with("DO NOT EXECUTE"));
                        assert!(!assessment.errors.is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn test_missing_checksum_blocks_regardless_of_signature() {
        for a in AUTHENTICITY {
            for r in RISK {
                let assessment = decide(IntegrityStatus::Missing, a, r);
                assert_eq!(assessment.recommendation, Recommendation::Block);
                assert!(assessment.message.contains("No checksum"));
            }
        }
    }

    #[test]
    fn test_invalid_checksum_blocks() {
        let assessment = decide(
            IntegrityStatus::Invalid,
            AuthenticityStatus::Verified,
            RiskLevel::Low,
        );
        assert_eq!(assessment.recommendation, Recommendation::Block);
        assert!(assessment.message.contains("tampered"));
    }

    #[test]
    fn test_authenticity_error_blocks() {
        let assessment = recommend(
            &integrity(IntegrityStatus::Valid),
            &AuthenticityResult::error("No verifier registered for algorithm: rsa"),
            &risk(RiskLevel::Low),
        );
        assert_eq!(assessment.recommendation, Recommendation::Block);
        assert!(assessment.message.contains("rsa"));
    }

    #[test]
    fn test_invalid_signature_blocks() {
        for r in RISK {
            let assessment = decide(IntegrityStatus::Valid, AuthenticityStatus::Invalid, r);
            assert_eq!(assessment.recommendation, Recommendation::Block);
        }
    }

    #[test]
    fn test_only_verified_low_risk_allows() {
        for i in INTEGRITY {
            for a in AUTHENTICITY {
                for r in RISK {
                    let allowed = decide(i, a, r).recommendation == Recommendation::Allow;
                    let expected = i == IntegrityStatus::Valid
                        && a == AuthenticityStatus::Verified
                        && r == RiskLevel::Low;
                    assert_eq!(allowed, expected, "{i:?}/{a:?}/{r:?}");
                }
            }
        }
    }

    #[test]
    fn test_unsigned_medium_warns() {
        let assessment = decide(
            IntegrityStatus::Valid,
            AuthenticityStatus::Unsigned,
            RiskLevel::Medium,
        );
        assert_eq!(assessment.recommendation, Recommendation::Warn);
        assert!(assessment.message.contains("not signed"));
        assert!(assessment.errors.is_empty());
    }

    #[test]
    fn test_warn_reasons_accumulate() {
        let assessment = decide(
            IntegrityStatus::Valid,
            AuthenticityStatus::SignedUnknown,
            RiskLevel::Critical,
        );

        assert_eq!(assessment.recommendation, Recommendation::Warn);
        assert_eq!(
            assessment.message,
            "WARNING: Signature is valid but signer is not in your trusted keys list. \
             High risk level: critical. Review before execution."
        );
    }

    #[test]
    fn test_verified_high_risk_warns() {
        let assessment = decide(
            IntegrityStatus::Valid,
            AuthenticityStatus::Verified,
            RiskLevel::High,
        );
        assert_eq!(assessment.recommendation, Recommendation::Warn);
        assert_eq!(
            assessment.message,
            "WARNING: High risk level: high. Review before execution."
        );
    }

    #[test]
    fn test_verified_medium_gets_generic_warning() {
        let assessment = decide(
            IntegrityStatus::Valid,
            AuthenticityStatus::Verified,
            RiskLevel::Medium,
        );
        assert_eq!(assessment.recommendation, Recommendation::Warn);
        assert!(assessment.message.contains("Review before execution"));
        assert!(!assessment.message.starts_with("WARNING:"));
    }
}
