//! Subcommand implementations.
//!
//! Each command writes its user-facing output to `out` and returns the
//! process exit code. Failures to read or parse the dossier are errors.

use anyhow::{Context, Result};
use dossier_verification::{
    calculate_checksum, load_trusted_keys, read_document, seal, validate_required_fields,
    AwsKmsClientFactory, DossierVerificationApi, DossierVerificationService, Ed25519Signer,
    KmsSigner, ParsedDocument, Signer, VerificationConfig,
};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tracing::info;

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn load(file: &Path) -> Result<ParsedDocument> {
    read_document(file).with_context(|| format!("Cannot load dossier {}", file.display()))
}

fn write_dossier(file: &Path, content: &str) -> Result<()> {
    std::fs::write(file, content)
        .with_context(|| format!("Failed to write dossier {}", file.display()))
}

// =============================================================================
// verify
// =============================================================================

pub async fn verify(
    config: VerificationConfig,
    file: &Path,
    trusted_keys: Option<&Path>,
    json: bool,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let service = DossierVerificationService::with_defaults(config);
    let result = service
        .verify(file, trusted_keys)
        .await
        .with_context(|| format!("Cannot verify dossier {}", file.display()))?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        write!(out, "{}", crate::report::render_report(&result))?;
    }

    Ok(exit_code(result.recommendation.exit_code()))
}

// =============================================================================
// checksum
// =============================================================================

pub fn checksum(file: &Path, write: bool, out: &mut dyn Write) -> Result<ExitCode> {
    let document = load(file)?;
    let hash = calculate_checksum(document.body());

    if write {
        let metadata = document.metadata().with_checksum(hash.clone());
        write_dossier(file, &ParsedDocument::render(&metadata, document.body())?)?;
        info!(file = %file.display(), checksum = %hash, "Checksum written");
    }

    writeln!(out, "{hash}")?;
    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// sign / sign-kms
// =============================================================================

/// Signing options shared by both signing commands.
pub struct SignOptions<'a> {
    pub file: &'a Path,
    pub signed_by: Option<String>,
    pub dry_run: bool,
}

fn dry_run(document: &ParsedDocument, out: &mut dyn Write) -> Result<ExitCode> {
    let hash = calculate_checksum(document.body());
    let metadata = document.metadata().with_checksum(hash.clone());

    writeln!(out, "SHA256: {hash}")?;
    writeln!(out, "Dry run complete (checksum calculated, no signature)")?;
    writeln!(out, "{}", metadata.to_header_json()?)?;
    Ok(ExitCode::SUCCESS)
}

async fn sign_and_write(
    document: &ParsedDocument,
    file: &Path,
    signer: &dyn Signer,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let sealed = seal(document, signer).await.context("Signing failed")?;
    write_dossier(file, &ParsedDocument::render(&sealed, document.body())?)?;

    writeln!(out, "Dossier signed: {}", file.display())?;
    if let Some(signature) = &sealed.signature {
        writeln!(out, "  Algorithm: {}", signature.algorithm)?;
        if let Some(key_id) = &signature.key_id {
            writeln!(out, "  Key ID: {key_id}")?;
        }
        writeln!(
            out,
            "  Signed by: {}",
            signature.signed_by.as_deref().unwrap_or("(not specified)")
        )?;
        writeln!(out, "  Timestamp: {}", signature.signed_at)?;
    }
    if let Some(checksum) = sealed.checksum_hash() {
        writeln!(out, "  Checksum: {checksum}")?;
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn sign(
    options: SignOptions<'_>,
    key: Option<&Path>,
    key_id: Option<String>,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let document = load(options.file)?;
    if options.dry_run {
        return dry_run(&document, out);
    }

    let key = key.context("--key is required (unless using --dry-run)")?;
    let mut signer = Ed25519Signer::from_file(key)
        .with_context(|| format!("Cannot load signing key {}", key.display()))?;
    if let Some(key_id) = key_id {
        signer = signer.with_key_id(key_id);
    }
    if let Some(signed_by) = options.signed_by {
        signer = signer.with_signed_by(signed_by);
    }

    sign_and_write(&document, options.file, &signer, out).await
}

pub async fn sign_kms(
    config: VerificationConfig,
    options: SignOptions<'_>,
    kms_key_id: &str,
    region: Option<&str>,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let document = load(options.file)?;
    if options.dry_run {
        return dry_run(&document, out);
    }

    let region = region.unwrap_or(&config.kms_region);
    let factory = AwsKmsClientFactory::new(config.kms_timeout);
    let mut signer = KmsSigner::from_factory(kms_key_id, &factory, region, config.kms_timeout)
        .context("Cannot create KMS client")?;
    if let Some(signed_by) = options.signed_by {
        signer = signer.with_signed_by(signed_by);
    }

    sign_and_write(&document, options.file, &signer, out).await
}

// =============================================================================
// validate
// =============================================================================

pub fn validate(file: &Path, out: &mut dyn Write) -> Result<ExitCode> {
    let document = load(file)?;
    let problems = validate_required_fields(document.metadata());

    if problems.is_empty() {
        writeln!(out, "{}: all required fields present", file.display())?;
        return Ok(ExitCode::SUCCESS);
    }

    writeln!(out, "{}: {} problem(s)", file.display(), problems.len())?;
    for problem in &problems {
        writeln!(out, "  - {problem}")?;
    }
    Ok(ExitCode::FAILURE)
}

// =============================================================================
// keys list
// =============================================================================

pub fn keys_list(
    config: &VerificationConfig,
    trusted_keys: Option<&Path>,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let path = trusted_keys
        .map(Path::to_path_buf)
        .or_else(|| config.resolved_trusted_keys_path());

    let Some(path) = path else {
        writeln!(out, "No trusted keys file (HOME is not set)")?;
        return Ok(ExitCode::SUCCESS);
    };

    let store = load_trusted_keys(Some(&path));
    writeln!(out, "{} ({} key(s))", path.display(), store.len())?;
    for (identifier, label) in store.entries() {
        writeln!(out, "  {label}: {identifier}")?;
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_verification::domain::trust::compact_public_key;
    use dossier_verification::{split, verify_integrity, IntegrityStatus, TrustStore};
    use std::path::PathBuf;
    use tempfile::TempDir;

    const DOSSIER: &str = "---dossier\n{\n  \"title\": \"Deploy\",\n  \"version\": \"1.0.0\",\n  \"protocol_version\": \"1.0\",\n  \"status\": \"stable\",\n  \"objective\": \"Ship it\",\n  \"risk_level\": \"low\",\n  \"risk_factors\": [],\n  \"destructive_operations\": [],\n  \"requires_approval\": false\n}\n---\n# Deploy\n\nRun the deploy.\n";

    fn fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_checksum_prints_and_writes() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "d.ds.md", DOSSIER);

        let mut out = Vec::new();
        assert_eq!(checksum(&path, false, &mut out).unwrap(), ExitCode::SUCCESS);
        let printed = output(out).trim().to_string();
        assert_eq!(printed.len(), 64);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DOSSIER);

        checksum(&path, true, &mut Vec::new()).unwrap();
        let written = split(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.metadata().checksum_hash(), Some(printed.as_str()));
        assert_eq!(
            verify_integrity(written.body(), written.metadata().checksum_hash()).status,
            IntegrityStatus::Valid
        );
    }

    #[tokio::test]
    async fn test_sign_then_verify_with_trusted_key() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "d.ds.md", DOSSIER);

        let signer = Ed25519Signer::generate();
        let key_path = fixture(&dir, "key.pem", &signer.private_key_pem().unwrap());
        let public_key = signer.public_key().await.unwrap();
        let trust = fixture(
            &dir,
            "trusted-keys.txt",
            &format!("{} CI Release Key\n", compact_public_key(&public_key)),
        );

        let options = SignOptions {
            file: &path,
            signed_by: Some("CI".to_string()),
            dry_run: false,
        };
        let mut out = Vec::new();
        sign(options, Some(key_path.as_path()), Some("ci-2024".to_string()), &mut out)
            .await
            .unwrap();
        assert!(output(out).contains("Key ID: ci-2024"));

        let mut out = Vec::new();
        let code = verify(VerificationConfig::default(), &path, Some(trust.as_path()), true, &mut out)
            .await
            .unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        let json: serde_json::Value = serde_json::from_str(&output(out)).unwrap();
        assert_eq!(json["recommendation"], "ALLOW");
        assert_eq!(json["authenticity"]["trustedAs"], "CI Release Key");
    }

    #[tokio::test]
    async fn test_sign_dry_run_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "d.ds.md", DOSSIER);

        let options = SignOptions {
            file: &path,
            signed_by: None,
            dry_run: true,
        };
        let mut out = Vec::new();
        sign(options, None, None, &mut out).await.unwrap();

        assert!(output(out).contains("\"checksum\""));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DOSSIER);
    }

    #[tokio::test]
    async fn test_verify_unsigned_exits_block_for_missing_checksum() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "d.ds.md", DOSSIER);
        let trust = fixture(&dir, "trusted-keys.txt", "");

        let mut out = Vec::new();
        let code = verify(VerificationConfig::default(), &path, Some(trust.as_path()), false, &mut out)
            .await
            .unwrap();

        assert_eq!(code, ExitCode::from(1));
        assert!(output(out).contains("RECOMMENDATION: BLOCK"));
    }

    #[tokio::test]
    async fn test_verify_malformed_is_error() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "plain.md", "# not a dossier\n");

        let result = verify(VerificationConfig::default(), &path, None, false, &mut Vec::new()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_problems() {
        let dir = TempDir::new().unwrap();
        let good = fixture(&dir, "good.ds.md", DOSSIER);
        let bad = fixture(
            &dir,
            "bad.ds.md",
            "---dossier\n{\"title\": \"x\", \"risk_level\": \"extreme\"}\n---\nbody\n",
        );

        assert_eq!(validate(&good, &mut Vec::new()).unwrap(), ExitCode::SUCCESS);

        let mut out = Vec::new();
        assert_eq!(validate(&bad, &mut out).unwrap(), ExitCode::FAILURE);
        let text = output(out);
        assert!(text.contains("extreme"));
        assert!(text.contains("version"));
    }

    #[test]
    fn test_keys_list() {
        let dir = TempDir::new().unwrap();
        let trust = fixture(
            &dir,
            "trusted-keys.txt",
            "# team keys\nkey-b Bravo Team\nkey-a Alpha Team\nbroken\n",
        );

        let mut out = Vec::new();
        keys_list(&VerificationConfig::default(), Some(trust.as_path()), &mut out).unwrap();
        let text = output(out);

        assert!(text.contains("(2 key(s))"));
        let alpha = text.find("Alpha Team: key-a").unwrap();
        let bravo = text.find("Bravo Team: key-b").unwrap();
        assert!(alpha < bravo);
        assert_eq!(TrustStore::load(&trust).len(), 2);
    }
}
