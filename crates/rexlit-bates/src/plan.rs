//! Bates numbering (C11, §4.8): sequential label assignment, optionally
//! grouped by document family, with collision and hash-mismatch detection.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use rexlit_common::error::{Error, Result};
use rexlit_common::hash::verify_file_hash;
use rexlit_common::ordering::{canonical_order, family_grouped_order};
use rexlit_discovery::DocumentRecord;

/// One `sha256`-to-label assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatesAssignment {
    pub document: String,
    pub sha256: String,
    pub bates_id: String,
}

/// Ordered set of assignments, ready for atomic JSONL persistence under
/// `schema_id="bates_map"`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatesPlan {
    pub assignments: Vec<BatesAssignment>,
    /// Present only when built with `plan_with_families`: number of
    /// documents in each family, keyed by family id.
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty", default)]
    pub family_counts: std::collections::HashMap<String, usize>,
}

/// Format a 1-based sequence number as `{prefix}{separator}{index:0width}`.
pub fn format_bates_id(prefix: &str, separator: &str, width: usize, index: u64) -> String {
    format!("{prefix}{separator}{index:0width$}")
}

fn reject_duplicates_and_verify(records: &[DocumentRecord]) -> Result<()> {
    let mut seen_paths = HashSet::new();
    let mut seen_hashes = HashSet::new();
    for record in records {
        if !seen_paths.insert(record.path.clone()) {
            return Err(Error::DuplicatePath {
                path: record.path.clone(),
            });
        }
        if !seen_hashes.insert(record.sha256.clone()) {
            return Err(Error::DuplicateHash {
                sha256: record.sha256.clone(),
            });
        }
        verify_file_hash(std::path::Path::new(&record.path), &record.sha256)?;
    }
    Ok(())
}

/// Assign sequential Bates labels to `records`, starting at 1, in
/// canonical `(sha256, path)` order (§4.8).
pub fn plan(
    records: Vec<DocumentRecord>,
    prefix: &str,
    width: usize,
    separator: &str,
) -> Result<BatesPlan> {
    reject_duplicates_and_verify(&records)?;
    let ordered = canonical_order(records);

    let mut assignments = Vec::with_capacity(ordered.len());
    let mut seen_bates = HashSet::new();
    for (idx, record) in ordered.iter().enumerate() {
        let bates_id = format_bates_id(prefix, separator, width, (idx as u64) + 1);
        if !seen_bates.insert(bates_id.clone()) {
            // Cannot occur if sequence integrity holds; checked defensively.
            return Err(Error::BatesCollision { bates_id });
        }
        assignments.push(BatesAssignment {
            document: record.path.clone(),
            sha256: record.sha256.clone(),
            bates_id,
        });
    }

    tracing::info!(count = assignments.len(), "bates plan assigned");
    Ok(BatesPlan {
        assignments,
        family_counts: Default::default(),
    })
}

/// Like [`plan`] but groups by family (§4.4) first: families in ascending
/// family-id order, documents in canonical order within each family, labels
/// assigned across the whole ordered sequence. Family sizes are returned
/// alongside for packaging.
pub fn plan_with_families(
    records: Vec<DocumentRecord>,
    prefix: &str,
    width: usize,
    separator: &str,
) -> Result<BatesPlan> {
    reject_duplicates_and_verify(&records)?;
    let families = family_grouped_order(records);

    let mut assignments = Vec::new();
    let mut family_counts = std::collections::HashMap::new();
    let mut seen_bates = HashSet::new();
    let mut index: u64 = 0;

    for (family_id, members) in families {
        family_counts.insert(family_id, members.len());
        for record in members {
            index += 1;
            let bates_id = format_bates_id(prefix, separator, width, index);
            if !seen_bates.insert(bates_id.clone()) {
                return Err(Error::BatesCollision { bates_id });
            }
            assignments.push(BatesAssignment {
                document: record.path.clone(),
                sha256: record.sha256.clone(),
                bates_id,
            });
        }
    }

    tracing::info!(
        count = assignments.len(),
        families = family_counts.len(),
        "bates plan with families assigned"
    );
    Ok(BatesPlan {
        assignments,
        family_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::io::Write;

    fn doc_with_content(dir: &std::path::Path, name: &str, content: &[u8]) -> DocumentRecord {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content).unwrap();
        drop(f);
        let sha256 = rexlit_common::hash::sha256_bytes(content);
        DocumentRecord {
            sha256,
            path: path.display().to_string(),
            size: content.len() as u64,
            mtime: Utc::now(),
            mime_type: "text/plain".to_string(),
            extension: "txt".to_string(),
            custodian: None,
            doctype: Some("text".to_string()),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn assigns_sequential_dense_labels() {
        let dir = tempfile::tempdir().unwrap();
        let a = doc_with_content(dir.path(), "a.txt", b"aaa");
        let b = doc_with_content(dir.path(), "b.txt", b"bbb");

        let result = plan(vec![a, b], "BATES", 6, "-").unwrap();
        assert_eq!(result.assignments.len(), 2);
        assert_eq!(result.assignments[0].bates_id, "BATES-000001");
        assert_eq!(result.assignments[1].bates_id, "BATES-000002");
    }

    #[test]
    fn rejects_duplicate_path() {
        let dir = tempfile::tempdir().unwrap();
        let a = doc_with_content(dir.path(), "a.txt", b"aaa");
        let mut dup = a.clone();
        dup.sha256 = rexlit_common::hash::sha256_bytes(b"different");

        let err = plan(vec![a, dup], "BATES", 6, "-").unwrap_err();
        assert!(matches!(err, Error::DuplicatePath { .. }));
    }

    #[test]
    fn rejects_hash_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = doc_with_content(dir.path(), "a.txt", b"aaa");
        a.sha256 = "0".repeat(64);

        let err = plan(vec![a], "BATES", 6, "-").unwrap_err();
        assert!(matches!(err, Error::HashMismatch { .. }));
    }

    #[test]
    fn family_grouping_orders_families_then_members() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = doc_with_content(dir.path(), "a.txt", b"aaa");
        a.metadata.insert("family_id".to_string(), serde_json::json!("fam-z"));
        let mut b = doc_with_content(dir.path(), "b.txt", b"bbb");
        b.metadata.insert("family_id".to_string(), serde_json::json!("fam-a"));

        let result = plan_with_families(vec![a, b], "BATES", 4, "-").unwrap();
        assert_eq!(result.assignments[0].bates_id, "BATES-0001");
        assert!(result.assignments[0].document.ends_with("b.txt"));
        assert_eq!(result.family_counts.len(), 2);
    }
}
