//! # Document Splitter
//!
//! Separates a raw dossier into its JSON metadata block and its body.
//!
//! ## Wire Format
//!
//! ```text
//! ---dossier
//! { ...metadata JSON... }
//! ---
//! body, verbatim
//! ```
//!
//! The opening line is `---dossier`; the metadata block ends at the first
//! line that is exactly `---` (trailing spaces, tabs or `\r` tolerated on
//! both delimiter lines). The body is every byte after the closing line's
//! newline, including leading blank lines and any trailing newline. It is
//! the exact string that is hashed and signed.

use super::entities::{ChecksumInfo, RiskAssessment, RiskLevel, SignatureResult};
use super::errors::DocumentError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// Opening delimiter line.
pub const OPENING_DELIMITER: &str = "---dossier";

/// Closing delimiter line.
pub const CLOSING_DELIMITER: &str = "---";

/// The only checksum algorithm written by this crate.
pub const CHECKSUM_ALGORITHM: &str = "sha256";

/// Fields every dossier must declare.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "version",
    "protocol_version",
    "title",
    "objective",
    "risk_level",
    "risk_factors",
    "destructive_operations",
];

/// JSON type expected for each recognized field.
const FIELD_TYPES: [(&str, &str); 11] = [
    ("version", "a string"),
    ("protocol_version", "a string"),
    ("title", "a string"),
    ("objective", "a string"),
    ("status", "a string"),
    ("risk_level", "a string"),
    ("risk_factors", "a list of strings"),
    ("destructive_operations", "a list of strings"),
    ("requires_approval", "a boolean"),
    ("checksum", "an object with algorithm and hash"),
    ("signature", "an object with algorithm, signature and public_key"),
];

/// Leading byte order mark some editors write.
const BOM: char = '\u{feff}';

// =============================================================================
// Metadata
// =============================================================================

/// Lifecycle status of a dossier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentStatus {
    Draft,
    Stable,
    Deprecated,
}

impl DocumentStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(DocumentStatus::Draft),
            "stable" => Some(DocumentStatus::Stable),
            "deprecated" => Some(DocumentStatus::Deprecated),
            _ => None,
        }
    }
}

/// Structured dossier header.
///
/// Enumerated fields (`status`, `risk_level`) are kept as authored so that a
/// bad value is reported by [`validate_required_fields`] instead of failing
/// the parse. A recognized field whose JSON type is wrong is left untyped in
/// `extra`, alongside unrecognized fields, and reported the same way.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_factors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destructive_operations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_approval: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<ChecksumInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureResult>,
    /// Fields this crate does not interpret, or could not type
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for Metadata {
    fn from(mut fields: Map<String, Value>) -> Self {
        Metadata {
            version: take_typed(&mut fields, "version"),
            protocol_version: take_typed(&mut fields, "protocol_version"),
            title: take_typed(&mut fields, "title"),
            objective: take_typed(&mut fields, "objective"),
            status: take_typed(&mut fields, "status"),
            risk_level: take_typed(&mut fields, "risk_level"),
            risk_factors: take_typed(&mut fields, "risk_factors"),
            destructive_operations: take_typed(&mut fields, "destructive_operations"),
            requires_approval: take_typed(&mut fields, "requires_approval"),
            checksum: take_typed(&mut fields, "checksum"),
            signature: take_typed(&mut fields, "signature"),
            extra: fields,
        }
    }
}

/// Move `name` out of `fields` if it converts to `T`. A `null` counts as
/// absent; a value of the wrong type stays in `fields`.
fn take_typed<T: DeserializeOwned>(fields: &mut Map<String, Value>, name: &str) -> Option<T> {
    let typed = match fields.get(name)? {
        Value::Null => None,
        value => Some(T::deserialize(value).ok()?),
    };
    fields.shift_remove(name);
    typed
}

impl Metadata {
    /// Why a declared `signature` block could not be read, if one was
    /// declared and could not.
    pub fn signature_problem(&self) -> Option<String> {
        if self.signature.is_some() {
            return None;
        }
        let declared = self.extra.get("signature")?;
        match SignatureResult::deserialize(declared) {
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        }
    }

    /// Declared checksum hash, if any. An empty hash counts as absent.
    pub fn checksum_hash(&self) -> Option<&str> {
        self.checksum
            .as_ref()
            .map(|c| c.hash.as_str())
            .filter(|h| !h.is_empty())
    }

    /// Parsed lifecycle status; `None` when absent or unrecognized.
    pub fn document_status(&self) -> Option<DocumentStatus> {
        self.status.as_deref().and_then(DocumentStatus::parse)
    }

    /// Risk declarations with defaults applied: unknown level, empty lists,
    /// approval required.
    pub fn risk_assessment(&self) -> RiskAssessment {
        RiskAssessment {
            risk_level: self
                .risk_level
                .as_deref()
                .and_then(RiskLevel::parse)
                .unwrap_or(RiskLevel::Unknown),
            risk_factors: self.risk_factors.clone().unwrap_or_default(),
            destructive_operations: self.destructive_operations.clone().unwrap_or_default(),
            requires_approval: self.requires_approval.unwrap_or(true),
        }
    }

    /// A copy of this metadata carrying the given SHA-256 checksum.
    pub fn with_checksum(&self, hash: impl Into<String>) -> Metadata {
        let mut metadata = self.clone();
        metadata.extra.shift_remove("checksum");
        metadata.checksum = Some(ChecksumInfo {
            algorithm: CHECKSUM_ALGORITHM.to_string(),
            hash: hash.into(),
        });
        metadata
    }

    /// A copy of this metadata carrying the given signature.
    pub fn with_signature(&self, signature: SignatureResult) -> Metadata {
        let mut metadata = self.clone();
        metadata.extra.shift_remove("signature");
        metadata.signature = Some(signature);
        metadata
    }

    /// Pretty-printed JSON header block.
    pub fn to_header_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DocumentError::InvalidMetadataJson(e.to_string()))
    }
}

// =============================================================================
// Parsed Document
// =============================================================================

/// A dossier split into metadata and body.
///
/// Immutable once created; signing produces new metadata and a new rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedDocument {
    metadata: Metadata,
    body: String,
    raw: String,
}

impl ParsedDocument {
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The exact bytes that are hashed and signed.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The original document text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn into_parts(self) -> (Metadata, String) {
        (self.metadata, self.body)
    }

    /// Reassemble a document from metadata and a verbatim body.
    ///
    /// `split(render(m, b))` yields body `b` unchanged.
    pub fn render(metadata: &Metadata, body: &str) -> Result<String, DocumentError> {
        let header = metadata.to_header_json()?;
        Ok(format!(
            "{OPENING_DELIMITER}\n{header}\n{CLOSING_DELIMITER}\n{body}"
        ))
    }
}

/// Split raw dossier text into metadata and body.
///
/// A leading UTF-8 byte order mark is skipped.
///
/// # Errors
///
/// * `DocumentError::MalformedDocument` - delimiter shape absent
/// * `DocumentError::InvalidMetadataJson` - delimiters present, JSON unparsable
pub fn split(raw: &str) -> Result<ParsedDocument, DocumentError> {
    let after_open = raw
        .strip_prefix(BOM)
        .unwrap_or(raw)
        .strip_prefix(OPENING_DELIMITER)
        .ok_or(DocumentError::MalformedDocument)?;

    let open_end = after_open
        .find('\n')
        .ok_or(DocumentError::MalformedDocument)?;
    if !is_horizontal_space(&after_open[..open_end]) {
        return Err(DocumentError::MalformedDocument);
    }

    let rest = &after_open[open_end + 1..];
    let mut offset = 0;
    loop {
        // A closing line must itself end in a newline.
        let line_end = rest[offset..]
            .find('\n')
            .map(|i| offset + i)
            .ok_or(DocumentError::MalformedDocument)?;
        let line = &rest[offset..line_end];

        if is_closing_line(line) {
            let block = rest[..offset].strip_suffix('\n').unwrap_or(&rest[..offset]);
            let body = &rest[line_end + 1..];

            let metadata: Metadata = serde_json::from_str(block)
                .map_err(|e| DocumentError::InvalidMetadataJson(e.to_string()))?;

            return Ok(ParsedDocument {
                metadata,
                body: body.to_string(),
                raw: raw.to_string(),
            });
        }

        offset = line_end + 1;
    }
}

/// Read a dossier file and split it.
pub fn read_document(path: &Path) -> Result<ParsedDocument, DocumentError> {
    let raw = std::fs::read_to_string(path).map_err(|e| DocumentError::Io {
        path: path.display().to_string(),
        reason: if e.kind() == std::io::ErrorKind::NotFound {
            "file not found".to_string()
        } else {
            e.to_string()
        },
    })?;
    split(&raw)
}

fn is_horizontal_space(s: &str) -> bool {
    s.chars().all(|c| c == ' ' || c == '\t' || c == '\r')
}

fn is_closing_line(line: &str) -> bool {
    line.strip_prefix(CLOSING_DELIMITER)
        .is_some_and(is_horizontal_space)
}

// =============================================================================
// Validation
// =============================================================================

/// A problem found in otherwise parseable metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationProblem {
    MissingRequiredField(&'static str),
    InvalidFieldType {
        field: &'static str,
        expected: &'static str,
    },
    InvalidRiskLevel(String),
    InvalidStatus(String),
}

impl fmt::Display for ValidationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationProblem::MissingRequiredField(field) => {
                write!(f, "Missing required field: {field}")
            }
            ValidationProblem::InvalidFieldType { field, expected } => {
                write!(f, "Invalid type for {field}: expected {expected}")
            }
            ValidationProblem::InvalidRiskLevel(value) => write!(
                f,
                "Invalid risk_level: {value}. Must be one of: low, medium, high, critical"
            ),
            ValidationProblem::InvalidStatus(value) => write!(
                f,
                "Invalid status: {value}. Must be one of: draft, stable, deprecated"
            ),
        }
    }
}

/// Enumerate missing required fields and invalid enum values.
///
/// Never fails; callers decide whether problems are fatal (executing) or
/// informational (listing).
pub fn validate_required_fields(metadata: &Metadata) -> Vec<ValidationProblem> {
    let present = [
        metadata.version.is_some(),
        metadata.protocol_version.is_some(),
        metadata.title.is_some(),
        metadata.objective.is_some(),
        metadata.risk_level.is_some(),
        metadata.risk_factors.is_some(),
        metadata.destructive_operations.is_some(),
    ];

    let mut problems: Vec<ValidationProblem> = REQUIRED_FIELDS
        .iter()
        .zip(present)
        .filter(|(field, present)| !present && !metadata.extra.contains_key(**field))
        .map(|(field, _)| ValidationProblem::MissingRequiredField(*field))
        .collect();

    // Recognized fields still in `extra` had the wrong JSON type.
    problems.extend(
        FIELD_TYPES
            .iter()
            .filter(|(field, _)| metadata.extra.contains_key(*field))
            .map(|(field, expected)| ValidationProblem::InvalidFieldType {
                field: *field,
                expected: *expected,
            }),
    );

    if let Some(level) = metadata.risk_level.as_deref() {
        if RiskLevel::parse(level).is_none() {
            problems.push(ValidationProblem::InvalidRiskLevel(level.to_string()));
        }
    }

    if let Some(status) = metadata.status.as_deref() {
        if DocumentStatus::parse(status).is_none() {
            problems.push(ValidationProblem::InvalidStatus(status.to_string()));
        }
    }

    problems
}
