//! Verification configuration from environment variables.

use crate::domain::trust::default_trusted_keys_path;
use crate::verifiers::kms::{DEFAULT_KMS_TIMEOUT, DEFAULT_REGION};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime knobs for the verification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationConfig {
    /// Trust file; `None` falls back to `$HOME/.dossier/trusted-keys.txt`
    pub trusted_keys_path: Option<PathBuf>,

    /// Region for KMS key ids that carry none
    pub kms_region: String,

    /// Bound on every remote KMS call
    pub kms_timeout: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            trusted_keys_path: None,
            kms_region: DEFAULT_REGION.to_string(),
            kms_timeout: DEFAULT_KMS_TIMEOUT,
        }
    }
}

impl VerificationConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DOSSIER_TRUSTED_KEYS`: trust file path (default: ~/.dossier/trusted-keys.txt)
    /// - `DOSSIER_KMS_REGION` or `AWS_REGION`: default KMS region (default: us-east-1)
    /// - `DOSSIER_KMS_TIMEOUT_SECS`: KMS call timeout in seconds (default: 10)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            trusted_keys_path: non_empty("DOSSIER_TRUSTED_KEYS").map(PathBuf::from),

            kms_region: non_empty("DOSSIER_KMS_REGION")
                .or_else(|| non_empty("AWS_REGION"))
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),

            kms_timeout: non_empty("DOSSIER_KMS_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_KMS_TIMEOUT),
        }
    }

    /// Builder-style override of the trust file.
    pub fn with_trusted_keys(mut self, path: impl Into<PathBuf>) -> Self {
        self.trusted_keys_path = Some(path.into());
        self
    }

    /// Trust file to load: the explicit path, or the per-user default.
    pub fn resolved_trusted_keys_path(&self) -> Option<PathBuf> {
        self.trusted_keys_path
            .clone()
            .or_else(default_trusted_keys_path)
    }
}
