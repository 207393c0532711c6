//! Audit ledger entry shape and hashing (§3, §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use rexlit_common::canonical::canonical_json;
use rexlit_common::error::Result;
use rexlit_common::hash::sha256_bytes;

/// `previous_hash` of the first entry in a ledger: 64 zero characters,
/// the width of a SHA-256 hex digest.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// A single append-only audit ledger entry.
///
/// `entry_hash` is computed over every other field (`entry_hash` and
/// `signature` excluded from their own hash input, per §9's note on
/// breaking the cyclic reference); `signature` is `HMAC-SHA256(key,
/// entry_hash)`, set after `entry_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub args: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub versions: HashMap<String, String>,
    pub previous_hash: String,
    pub entry_hash: String,
    pub signature: String,
}

/// Fields hashed to produce `entry_hash`: everything except `entry_hash`
/// and `signature` themselves.
#[derive(Serialize)]
struct HashableEntry<'a> {
    sequence: u64,
    timestamp: DateTime<Utc>,
    operation: &'a str,
    inputs: &'a [String],
    outputs: &'a [String],
    args: &'a HashMap<String, serde_json::Value>,
    versions: &'a HashMap<String, String>,
    previous_hash: &'a str,
}

impl AuditEntry {
    /// Build a fully-hashed and signed entry. `sign` is called with the
    /// computed `entry_hash` bytes and must return `HMAC-SHA256(key,
    /// entry_hash)` as lowercase hex.
    pub fn build(
        sequence: u64,
        operation: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        args: HashMap<String, serde_json::Value>,
        versions: HashMap<String, String>,
        previous_hash: String,
        timestamp: DateTime<Utc>,
        sign: impl FnOnce(&str) -> Result<String>,
    ) -> Result<Self> {
        let operation = operation.into();
        let hashable = HashableEntry {
            sequence,
            timestamp,
            operation: &operation,
            inputs: &inputs,
            outputs: &outputs,
            args: &args,
            versions: &versions,
            previous_hash: &previous_hash,
        };
        let entry_hash = sha256_bytes(canonical_json(&hashable)?.as_bytes());
        let signature = sign(&entry_hash)?;

        Ok(AuditEntry {
            sequence,
            timestamp,
            operation,
            inputs,
            outputs,
            args,
            versions,
            previous_hash,
            entry_hash,
            signature,
        })
    }

    /// Recompute `entry_hash` from the entry's current fields.
    pub fn recompute_hash(&self) -> Result<String> {
        let hashable = HashableEntry {
            sequence: self.sequence,
            timestamp: self.timestamp,
            operation: &self.operation,
            inputs: &self.inputs,
            outputs: &self.outputs,
            args: &self.args,
            versions: &self.versions,
            previous_hash: &self.previous_hash,
        };
        Ok(sha256_bytes(canonical_json(&hashable)?.as_bytes()))
    }

    pub fn to_jsonl_line(&self) -> Result<String> {
        canonical_json(self)
    }

    pub fn from_jsonl_line(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(rexlit_common::error::Error::Json)
    }
}
