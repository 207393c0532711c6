//! Schema stamping (§4.1) and the forward-only migration registry.
//!
//! Every persisted artifact record is stamped exactly once, at write time,
//! with `{schema_id, schema_version, producer, produced_at, content_hash}`.
//! The stamp is a value type applied at the JSONL writer boundary (§9) so no
//! component hand-constructs schema metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::canonical::canonical_json;
use crate::error::{Error, Result};
use crate::hash::sha256_bytes;

/// The schema envelope embedded in every persisted record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaStamp {
    pub schema_id: String,
    pub schema_version: u32,
    pub producer: String,
    pub produced_at: DateTime<Utc>,
    pub content_hash: String,
}

/// Stamp `record` (an arbitrary serializable map-like value) with a fresh
/// [`SchemaStamp`], computing `content_hash` over the record's fields
/// excluding the schema fields themselves and `content_hash`.
///
/// `record` must serialize to a JSON object; any other shape is a
/// programmer error and panics, since every artifact record in this system
/// is a struct.
pub fn stamp_record<T: Serialize>(
    record: &T,
    schema_id: &str,
    schema_version: u32,
    producer: &str,
    now: DateTime<Utc>,
) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(record).map_err(Error::Json)?;
    let obj = value
        .as_object_mut()
        .expect("stamped records must serialize to a JSON object");

    // content_hash is computed over the record's own fields only; the
    // schema envelope fields are never part of the hashed content.
    let content_hash = sha256_bytes(canonical_json(&obj.clone())?.as_bytes());

    obj.insert("schema_id".to_string(), serde_json::json!(schema_id));
    obj.insert("schema_version".to_string(), serde_json::json!(schema_version));
    obj.insert("producer".to_string(), serde_json::json!(producer));
    obj.insert("produced_at".to_string(), serde_json::json!(now.to_rfc3339()));
    obj.insert("content_hash".to_string(), serde_json::json!(content_hash));

    Ok(value)
}

/// A single forward migration step for one schema.
pub struct MigrationStep {
    pub from_version: u32,
    pub to_version: u32,
    pub transform: fn(serde_json::Value) -> Result<serde_json::Value>,
}

/// Maps `(schema_id, from_version) -> MigrationStep`. Owned by the bootstrap
/// context (§4.14), never a process-global table, so tests can register
/// scoped migrations without cross-test leakage.
#[derive(Default)]
pub struct MigrationRegistry {
    steps: HashMap<(String, u32), MigrationStep>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration step. Panics if `to_version <= from_version`:
    /// migrations strictly increase version numbers, no downgrades.
    pub fn register(&mut self, schema_id: impl Into<String>, step: MigrationStep) {
        assert!(
            step.to_version > step.from_version,
            "migrations must strictly increase schema_version"
        );
        self.steps.insert((schema_id.into(), step.from_version), step);
    }

    /// Migrate `record` forward from `from_version` to the latest registered
    /// version for `schema_id`, re-stamping `content_hash` after each hop.
    pub fn migrate(
        &self,
        schema_id: &str,
        mut record: serde_json::Value,
        mut from_version: u32,
        producer: &str,
        now: DateTime<Utc>,
    ) -> Result<serde_json::Value> {
        loop {
            let Some(step) = self.steps.get(&(schema_id.to_string(), from_version)) else {
                return Ok(record);
            };
            record = (step.transform)(record)?;
            let obj = record
                .as_object_mut()
                .ok_or_else(|| Error::SchemaValidation {
                    schema_id: schema_id.to_string(),
                    reason: "migrated record is not a JSON object".to_string(),
                })?;
            obj.remove("content_hash");
            obj.remove("schema_id");
            obj.remove("schema_version");
            obj.remove("producer");
            obj.remove("produced_at");
            let content_hash = sha256_bytes(canonical_json(&obj.clone())?.as_bytes());
            obj.insert("schema_id".to_string(), serde_json::json!(schema_id));
            obj.insert("schema_version".to_string(), serde_json::json!(step.to_version));
            obj.insert("producer".to_string(), serde_json::json!(producer));
            obj.insert("produced_at".to_string(), serde_json::json!(now.to_rfc3339()));
            obj.insert("content_hash".to_string(), serde_json::json!(content_hash));
            from_version = step.to_version;
        }
    }
}
