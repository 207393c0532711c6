//! Redaction/highlight plan entry shapes and the `plan_id` fingerprint
//! (§3, §4.7).

use serde::{Deserialize, Serialize};

use rexlit_common::canonical::{canonical_json, sorted_join_hash};
use rexlit_common::error::Result;

use crate::pii::Match;

/// One redaction to apply at load/stamp time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedactionAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub category: String,
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub confidence: f64,
    pub replacement: String,
}

impl RedactionAction {
    pub fn from_match(m: &Match, page: Option<u32>) -> Self {
        let category = m.entity_type.as_str().to_string();
        RedactionAction {
            action_type: "redact".to_string(),
            replacement: format!("[{category}]"),
            category,
            start: m.start,
            end: m.end,
            page,
            confidence: m.score,
        }
    }
}

/// A document's redaction plan (§3). Persisted as a single AEAD-sealed
/// ciphertext line under `schema_id="redaction_plan"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedactionPlanEntry {
    pub document: String,
    pub sha256: String,
    pub plan_id: String,
    pub actions: Vec<RedactionAction>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RedactionPlanEntry {
    /// Build a plan entry, computing `plan_id` from the sorted-join
    /// fingerprint over `(abs_path, sha256, canonical(actions))` (§3).
    pub fn new(document: String, sha256: String, actions: Vec<RedactionAction>, notes: Option<String>) -> Result<Self> {
        let plan_id = compute_plan_id(&document, &sha256, &actions)?;
        Ok(RedactionPlanEntry {
            document,
            sha256,
            plan_id,
            actions,
            notes,
        })
    }

    /// Recompute `plan_id` from this entry's current fields, for the
    /// rewrite-is-a-no-op idempotence check (Invariant I3).
    pub fn recompute_plan_id(&self) -> Result<String> {
        compute_plan_id(&self.document, &self.sha256, &self.actions)
    }
}

/// A single highlight: offsets and classification only. Raw snippet text
/// and model reasoning are forbidden — only their digests are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Highlight {
    pub start: usize,
    pub end: usize,
    pub concept: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub color: String,
    pub shade: f64,
    pub snippet_hash: String,
    pub reasoning_hash: String,
}

/// A document's highlight plan (§3), mirroring `RedactionPlanEntry` but
/// keyed by `document_hash` and forbidding raw text in `highlights`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighlightPlanEntry {
    pub document_hash: String,
    pub plan_id: String,
    pub highlights: Vec<Highlight>,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl HighlightPlanEntry {
    pub fn new(
        document_hash: String,
        highlights: Vec<Highlight>,
        annotations: Vec<String>,
        notes: Option<String>,
    ) -> Result<Self> {
        let plan_id = compute_highlight_plan_id(&document_hash, &highlights, &annotations)?;
        Ok(HighlightPlanEntry {
            document_hash,
            plan_id,
            highlights,
            annotations,
            notes,
        })
    }

    pub fn recompute_plan_id(&self) -> Result<String> {
        compute_highlight_plan_id(&self.document_hash, &self.highlights, &self.annotations)
    }
}

fn compute_plan_id(document: &str, sha256: &str, actions: &[RedactionAction]) -> Result<String> {
    let components = vec![document.to_string(), sha256.to_string(), canonical_json(actions)?];
    Ok(sorted_join_hash(&components))
}

fn compute_highlight_plan_id(
    document_hash: &str,
    highlights: &[Highlight],
    annotations: &[String],
) -> Result<String> {
    let components = vec![
        document_hash.to_string(),
        canonical_json(highlights)?,
        canonical_json(annotations)?,
    ];
    Ok(sorted_join_hash(&components))
}
