//! Human-readable verification report.

use dossier_verification::{
    AuthenticityStatus, IntegrityStatus, Recommendation, VerificationResult,
};
use std::fmt::Write;

const RULE: &str = "------------------------------------------------------------";

fn upper(status: impl serde::Serialize) -> String {
    serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_uppercase))
        .unwrap_or_default()
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "YES"
    } else {
        "NO"
    }
}

/// Render `result` as the multi-section terminal report.
pub fn render_report(result: &VerificationResult) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, result);
    out
}

fn write_report(out: &mut String, result: &VerificationResult) -> std::fmt::Result {
    writeln!(out, "Dossier Verification Report")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "File: {}", result.dossier_file)?;
    writeln!(out, "{RULE}")?;
    writeln!(out)?;

    let integrity = &result.integrity;
    writeln!(out, "INTEGRITY CHECK (Checksum)")?;
    writeln!(out, "   Status: {}", upper(integrity.status))?;
    writeln!(out, "   {}", integrity.message)?;
    if integrity.status == IntegrityStatus::Invalid {
        if let (Some(expected), Some(actual)) = (&integrity.expected_hash, &integrity.actual_hash) {
            writeln!(out, "   Expected: {expected}")?;
            writeln!(out, "   Actual:   {actual}")?;
        }
    }
    writeln!(out)?;

    let authenticity = &result.authenticity;
    writeln!(out, "AUTHENTICITY CHECK (Signature)")?;
    writeln!(out, "   Status: {}", upper(authenticity.status))?;
    writeln!(out, "   {}", authenticity.message)?;
    if matches!(
        authenticity.status,
        AuthenticityStatus::Verified | AuthenticityStatus::SignedUnknown
    ) {
        if let Some(signer) = &authenticity.signer {
            writeln!(out, "   Signer: {signer}")?;
        }
        if let Some(key_id) = &authenticity.key_id {
            writeln!(out, "   Key ID: {key_id}")?;
        }
        writeln!(out, "   Trusted: {}", yes_no(authenticity.is_trusted))?;
    }
    writeln!(out)?;

    let risk = &result.risk_assessment;
    writeln!(out, "RISK ASSESSMENT")?;
    writeln!(out, "   Risk Level: {}", risk.risk_level.as_str().to_uppercase())?;
    if !risk.risk_factors.is_empty() {
        writeln!(out, "   Risk Factors:")?;
        for factor in &risk.risk_factors {
            writeln!(out, "     - {factor}")?;
        }
    }
    if !risk.destructive_operations.is_empty() {
        writeln!(out, "   Destructive Operations:")?;
        for op in &risk.destructive_operations {
            writeln!(out, "     - {op}")?;
        }
    }
    writeln!(out, "   Requires Approval: {}", yes_no(risk.requires_approval))?;
    writeln!(out)?;

    if !result.errors.is_empty() {
        writeln!(out, "ERRORS")?;
        for error in &result.errors {
            writeln!(out, "   - {error}")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{RULE}")?;
    writeln!(out, "RECOMMENDATION: {}", result.recommendation)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "{}", result.message)?;

    match result.recommendation {
        Recommendation::Allow => {}
        Recommendation::Warn => writeln!(out, "Only execute if you trust the source!")?,
        Recommendation::Block => writeln!(out, "DO NOT EXECUTE until issues are resolved!")?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_verification::{
        AuthenticityResult, IntegrityResult, RiskAssessment, RiskLevel,
    };

    fn result(recommendation: Recommendation) -> VerificationResult {
        VerificationResult {
            dossier_file: "deploy.ds.md".to_string(),
            integrity: IntegrityResult {
                status: IntegrityStatus::Invalid,
                message: "CHECKSUM MISMATCH - dossier has been tampered with!".to_string(),
                expected_hash: Some("aa".to_string()),
                actual_hash: Some("bb".to_string()),
            },
            authenticity: AuthenticityResult::error("Cannot verify signature - integrity check failed"),
            risk_assessment: RiskAssessment {
                risk_level: RiskLevel::High,
                risk_factors: vec!["deletes_files".to_string()],
                destructive_operations: vec![],
                requires_approval: true,
            },
            recommendation,
            message: "DO NOT EXECUTE - Checksum mismatch, dossier has been tampered with!"
                .to_string(),
            errors: vec!["Checksum verification FAILED - do not execute!".to_string()],
        }
    }

    #[test]
    fn test_report_sections() {
        let report = render_report(&result(Recommendation::Block));

        assert!(report.contains("File: deploy.ds.md"));
        assert!(report.contains("   Status: INVALID"));
        assert!(report.contains("   Expected: aa"));
        assert!(report.contains("   Status: ERROR"));
        assert!(report.contains("   Risk Level: HIGH"));
        assert!(report.contains("     - deletes_files"));
        assert!(!report.contains("Destructive Operations"));
        assert!(report.contains("ERRORS"));
        assert!(report.contains("RECOMMENDATION: BLOCK"));
        assert!(report.ends_with("DO NOT EXECUTE until issues are resolved!\n"));
    }

    #[test]
    fn test_signed_unknown_status_is_upper_snake() {
        let mut r = result(Recommendation::Warn);
        r.authenticity.status = AuthenticityStatus::SignedUnknown;
        r.authenticity.key_id = Some("k-1".to_string());

        let report = render_report(&r);
        assert!(report.contains("   Status: SIGNED_UNKNOWN"));
        assert!(report.contains("   Key ID: k-1"));
        assert!(report.contains("   Trusted: NO"));
    }
}
