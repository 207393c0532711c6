//! Production package manifest (§4.13): paired with the deterministic
//! artifact layout `create_pack` writes under `natives/`, `text/`,
//! `metadata/`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackManifest {
    pub pack_id: String,
    pub created_at: String,
    pub document_count: usize,
    pub total_pages: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bates_range: Option<String>,
    pub redaction_count: usize,
    /// Relative paths, sorted ascending for deterministic ordering.
    pub artifacts: Vec<String>,
}
