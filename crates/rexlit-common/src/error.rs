//! Unified error type for rexlit, with stable codes, categories, and
//! agent-facing structured output.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for rexlit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Path resolution / containment failures.
    Path,
    /// Content-addressing and hash-integrity failures.
    Integrity,
    /// Schema stamping and migration failures.
    Schema,
    /// Audit ledger failures.
    Ledger,
    /// Online/offline capability gating.
    Capability,
    /// Classifier envelope / circuit breaker failures.
    Classifier,
    /// Export/production format failures.
    Format,
    /// File I/O and serialization.
    Io,
    /// Crypto (AEAD/HMAC) failures.
    Crypto,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Path => write!(f, "path"),
            ErrorCategory::Integrity => write!(f, "integrity"),
            ErrorCategory::Schema => write!(f, "schema"),
            ErrorCategory::Ledger => write!(f, "ledger"),
            ErrorCategory::Capability => write!(f, "capability"),
            ErrorCategory::Classifier => write!(f, "classifier"),
            ErrorCategory::Format => write!(f, "format"),
            ErrorCategory::Io => write!(f, "io"),
            ErrorCategory::Crypto => write!(f, "crypto"),
        }
    }
}

/// Suggested remediation action for a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    Retry,
    RetryOnline,
    Rescan,
    ManualIntervention,
    Abort,
    Skip,
    None,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::RetryOnline => write!(f, "retry_online"),
            SuggestedAction::Rescan => write!(f, "rescan"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
            SuggestedAction::Abort => write!(f, "abort"),
            SuggestedAction::Skip => write!(f, "skip"),
            SuggestedAction::None => write!(f, "none"),
        }
    }
}

/// Unified error type for rexlit.
#[derive(Error, Debug)]
pub enum Error {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("path traversal: {path} resolves outside any allowed root")]
    PathTraversal { path: String },

    #[error("duplicate hash: {sha256}")]
    DuplicateHash { sha256: String },

    #[error("duplicate path: {path}")]
    DuplicatePath { path: String },

    #[error("bates collision: {bates_id}")]
    BatesCollision { bates_id: String },

    #[error("hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("plan fingerprint mismatch for {path}: expected {expected}, got {actual}")]
    PlanFingerprintMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("schema validation failed for {schema_id}: {reason}")]
    SchemaValidation { schema_id: String, reason: String },

    #[error("no migration path for {schema_id} from version {from_version}")]
    SchemaMigration { schema_id: String, from_version: u32 },

    #[error("audit ledger corrupted: {reason}")]
    LedgerCorruption { reason: String },

    #[error("feature '{feature}' requires online mode")]
    OfflineFeatureRequired { feature: String },

    #[error("circuit breaker open (failed {failures} times, retry after {timeout_seconds}s)")]
    CircuitBreakerOpen { failures: u32, timeout_seconds: f64 },

    #[error("operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("model output malformed: {0}")]
    ModelOutputMalformed(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("write failed for {path}: {reason}")]
    IoWriteFailed { path: String, reason: String },

    #[error("decrypt failed for {path}")]
    DecryptFailed { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable numeric code, grouped by category (10-19 path, 20-29 integrity,
    /// 30-39 schema, 40-49 ledger, 50-59 capability, 60-69 classifier,
    /// 70-79 format, 80-89 io, 90-99 crypto).
    pub fn code(&self) -> u32 {
        match self {
            Error::NotFound(_) => 10,
            Error::PathTraversal { .. } => 11,
            Error::DuplicateHash { .. } => 20,
            Error::DuplicatePath { .. } => 21,
            Error::BatesCollision { .. } => 22,
            Error::HashMismatch { .. } => 23,
            Error::PlanFingerprintMismatch { .. } => 24,
            Error::SchemaValidation { .. } => 30,
            Error::SchemaMigration { .. } => 31,
            Error::LedgerCorruption { .. } => 40,
            Error::OfflineFeatureRequired { .. } => 50,
            Error::CircuitBreakerOpen { .. } => 60,
            Error::Timeout { .. } => 61,
            Error::ModelOutputMalformed(_) => 62,
            Error::InvalidFormat(_) => 70,
            Error::NotImplemented(_) => 71,
            Error::IoWriteFailed { .. } => 80,
            Error::Io(_) => 81,
            Error::Json(_) => 82,
            Error::DecryptFailed { .. } => 90,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound(_) | Error::PathTraversal { .. } => ErrorCategory::Path,
            Error::DuplicateHash { .. }
            | Error::DuplicatePath { .. }
            | Error::BatesCollision { .. }
            | Error::HashMismatch { .. }
            | Error::PlanFingerprintMismatch { .. } => ErrorCategory::Integrity,
            Error::SchemaValidation { .. } | Error::SchemaMigration { .. } => ErrorCategory::Schema,
            Error::LedgerCorruption { .. } => ErrorCategory::Ledger,
            Error::OfflineFeatureRequired { .. } => ErrorCategory::Capability,
            Error::CircuitBreakerOpen { .. }
            | Error::Timeout { .. }
            | Error::ModelOutputMalformed(_) => ErrorCategory::Classifier,
            Error::InvalidFormat(_) | Error::NotImplemented(_) => ErrorCategory::Format,
            Error::IoWriteFailed { .. } | Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
            Error::DecryptFailed { .. } => ErrorCategory::Crypto,
        }
    }

    /// Whether the failure is the kind of thing a caller can reasonably retry
    /// or recover from, as opposed to an integrity violation that must halt.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::NotFound(_) => false,
            Error::PathTraversal { .. } => false,
            Error::DuplicateHash { .. }
            | Error::DuplicatePath { .. }
            | Error::BatesCollision { .. }
            | Error::HashMismatch { .. }
            | Error::PlanFingerprintMismatch { .. } => false,
            Error::SchemaValidation { .. } => false,
            Error::SchemaMigration { .. } => false,
            Error::LedgerCorruption { .. } => false,
            Error::OfflineFeatureRequired { .. } => true,
            Error::CircuitBreakerOpen { .. } => true,
            Error::Timeout { .. } => true,
            Error::ModelOutputMalformed(_) => false,
            Error::InvalidFormat(_) => false,
            Error::NotImplemented(_) => false,
            Error::IoWriteFailed { .. } => true,
            Error::Io(_) => true,
            Error::Json(_) => false,
            Error::DecryptFailed { .. } => false,
        }
    }

    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::NotFound(_) => SuggestedAction::Abort,
            Error::PathTraversal { .. } => SuggestedAction::Abort,
            Error::DuplicateHash { .. }
            | Error::DuplicatePath { .. }
            | Error::BatesCollision { .. } => SuggestedAction::ManualIntervention,
            Error::HashMismatch { .. } | Error::PlanFingerprintMismatch { .. } => {
                SuggestedAction::ManualIntervention
            }
            Error::SchemaValidation { .. } | Error::SchemaMigration { .. } => {
                SuggestedAction::ManualIntervention
            }
            Error::LedgerCorruption { .. } => SuggestedAction::ManualIntervention,
            Error::OfflineFeatureRequired { .. } => SuggestedAction::RetryOnline,
            Error::CircuitBreakerOpen { .. } => SuggestedAction::Retry,
            Error::Timeout { .. } => SuggestedAction::Retry,
            Error::ModelOutputMalformed(_) => SuggestedAction::Skip,
            Error::InvalidFormat(_) | Error::NotImplemented(_) => SuggestedAction::Abort,
            Error::IoWriteFailed { .. } | Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
            Error::DecryptFailed { .. } => SuggestedAction::ManualIntervention,
        }
    }
}

/// Structured, agent-facing rendering of an [`Error`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    pub suggested_action: SuggestedAction,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();
        match err {
            Error::PathTraversal { path } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::HashMismatch {
                path,
                expected,
                actual,
            } => {
                context.insert("path".to_string(), serde_json::json!(path));
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            Error::PlanFingerprintMismatch { path, .. } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::OfflineFeatureRequired { feature } => {
                context.insert("feature".to_string(), serde_json::json!(feature));
            }
            _ => {}
        }
        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code))
    }
}
