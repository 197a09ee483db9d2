//! # Trust Store
//!
//! Mapping from signer key identifiers to human-readable names.
//!
//! ## File Format
//!
//! ```text
//! # comment
//! MCowBQYDK2VwAyEA... Imboard AI Official
//! arn:aws:kms:us-east-1:123456789012:key/abcd release-signing
//! ```
//!
//! One entry per line: an identifier, whitespace, then a label that may
//! itself contain spaces. Blank lines and `#` lines are ignored. Lines with
//! fewer than two tokens are skipped with a warning. A missing file is an
//! empty store: trust is opt-in.
//!
//! Lookups are by one identity at a time. Callers pick the identity the
//! signature scheme actually authenticated: the public key for Ed25519, the
//! key id for a KMS key.
//!
//! A store is loaded per call and never mutated afterwards; reloading
//! replaces it wholesale.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory under `$HOME` holding per-user dossier state.
pub const DOSSIER_DIR: &str = ".dossier";

/// Default trust file name.
pub const TRUSTED_KEYS_FILE: &str = "trusted-keys.txt";

/// `$HOME/.dossier/trusted-keys.txt`, if a home directory is known.
pub fn default_trusted_keys_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(DOSSIER_DIR).join(TRUSTED_KEYS_FILE))
}

/// Load the trust store from `path`, or from the default location.
pub fn load_trusted_keys(path: Option<&Path>) -> TrustStore {
    match path {
        Some(path) => TrustStore::load(path),
        None => match default_trusted_keys_path() {
            Some(path) => TrustStore::load(&path),
            None => {
                info!("No home directory; using empty trust store");
                TrustStore::empty()
            }
        },
    }
}

/// Immutable identifier → label mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrustStore {
    keys: HashMap<String, String>,
}

impl TrustStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse trust file contents. Later duplicates replace earlier ones.
    pub fn parse(content: &str) -> Self {
        let mut keys = HashMap::new();

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut tokens = trimmed.split_whitespace();
            let identifier = tokens.next();
            let label = tokens.collect::<Vec<_>>().join(" ");

            match identifier {
                Some(identifier) if !label.is_empty() => {
                    debug!(label = %label, "Loaded trusted key");
                    keys.insert(identifier.to_string(), label);
                }
                _ => {
                    warn!(line = index + 1, "Skipping malformed line in trusted keys file");
                }
            }
        }

        Self { keys }
    }

    /// Load from a file. A missing or unreadable file yields an empty store.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let store = Self::parse(&content);
                info!(count = store.len(), path = %path.display(), "Loaded trusted keys");
                store
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No trusted keys file found");
                Self::empty()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read trusted keys file");
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Label for an exact identifier.
    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.keys.get(identifier).map(String::as_str)
    }

    /// Entries sorted by identifier.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self
            .keys
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_unstable();
        entries
    }

    /// Trusted label for a public key, as written or in its compact
    /// single-token form (PEM armor and whitespace removed).
    pub fn lookup_public_key(&self, public_key: &str) -> Option<&str> {
        if public_key.trim().is_empty() {
            return None;
        }
        self.get(public_key)
            .or_else(|| self.get(&compact_public_key(public_key)))
    }

    /// Trusted label for a key identifier such as a KMS key ARN.
    pub fn lookup_key_id(&self, key_id: &str) -> Option<&str> {
        if key_id.is_empty() {
            return None;
        }
        self.get(key_id)
    }
}

/// Single-token form of a public key: PEM armor lines dropped and all
/// whitespace removed. For an Ed25519 PEM key this is the base64 SPKI DER.
pub fn compact_public_key(public_key: &str) -> String {
    public_key
        .lines()
        .filter(|line| !line.trim_start().starts_with("-----"))
        .flat_map(|line| line.split_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PEM: &str = "-----BEGIN PUBLIC KEY-----\nMCowBQYDK2VwAyEAGb9ECWmEzf6FQbrBZ9w7lshQhqowtrbLDFw4rXAxZuE=\n-----END PUBLIC KEY-----\n";

    #[test]
    fn test_parse_entries() {
        let store = TrustStore::parse("RWTKey1== official-key-1\nRWTKey2== official-key-2");

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("RWTKey1=="), Some("official-key-1"));
        assert_eq!(store.get("RWTKey2=="), Some("official-key-2"));
    }

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let store = TrustStore::parse("# header\n\nRWTKey1== key-1\n   \n  # indented comment\nRWTKey2== key-2\n\n");

        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_parse_labels_with_spaces() {
        let store = TrustStore::parse("RWTKey1== Official   Key Name\n");
        assert_eq!(store.get("RWTKey1=="), Some("Official Key Name"));
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let store = TrustStore::parse("RWTKey1== key-1\nInvalidLineWithoutSpace\nRWTKey2== key-2");

        assert_eq!(store.len(), 2);
        assert!(store.get("InvalidLineWithoutSpace").is_none());
    }

    #[test]
    fn test_parse_tab_separated() {
        let store = TrustStore::parse("key-a\tTeam A\n");
        assert_eq!(store.get("key-a"), Some("Team A"));
    }

    #[test]
    fn test_parse_duplicate_identifier_keeps_last() {
        let store = TrustStore::parse("k first\nk second\n");

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("k"), Some("second"));
    }

    #[test]
    fn test_load_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..5 {
            writeln!(file, "key-{i} Signer {i}").unwrap();
        }
        writeln!(file, "orphan").unwrap();

        let store = TrustStore::load(file.path());

        assert_eq!(store.len(), 5);
        assert_eq!(store.get("key-3"), Some("Signer 3"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let store = TrustStore::load(Path::new("/tmp/nonexistent-dossier-keys-12345.txt"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_empty_and_comment_only_files() {
        let empty = tempfile::NamedTempFile::new().unwrap();
        assert!(TrustStore::load(empty.path()).is_empty());

        let mut comments = tempfile::NamedTempFile::new().unwrap();
        write!(comments, "# Comment 1\n# Comment 2\n").unwrap();
        assert!(TrustStore::load(comments.path()).is_empty());
    }

    #[test]
    fn test_lookups_are_separate() {
        let store = TrustStore::parse("pk-1 By Key\nid-1 By Id\n");

        assert_eq!(store.lookup_public_key("pk-1"), Some("By Key"));
        assert_eq!(store.lookup_key_id("id-1"), Some("By Id"));
        assert_eq!(store.lookup_public_key("pk-other"), None);
        assert_eq!(store.lookup_public_key(""), None);
        assert_eq!(store.lookup_key_id(""), None);
    }

    #[test]
    fn test_lookup_matches_compact_pem() {
        let store = TrustStore::parse(
            "MCowBQYDK2VwAyEAGb9ECWmEzf6FQbrBZ9w7lshQhqowtrbLDFw4rXAxZuE= Release Key\n",
        );

        assert_eq!(store.lookup_public_key(PEM), Some("Release Key"));
    }

    #[test]
    fn test_compact_public_key() {
        assert_eq!(
            compact_public_key(PEM),
            "MCowBQYDK2VwAyEAGb9ECWmEzf6FQbrBZ9w7lshQhqowtrbLDFw4rXAxZuE="
        );
        assert_eq!(compact_public_key("plain-token"), "plain-token");
    }

    #[test]
    fn test_entries_sorted() {
        let store = TrustStore::parse("b two\na one\n");
        assert_eq!(store.entries(), vec![("a", "one"), ("b", "two")]);
    }
}
