//! Dedup (C9): hash-keyed first-wins over a canonically ordered stream.

use std::collections::HashSet;

use rexlit_common::error::{Error, Result};
use rexlit_common::ordering::canonical_order;

use crate::document::DocumentRecord;

/// Order `records` canonically and keep only the first record for each
/// unique `sha256` (§4.6).
pub fn dedup(records: Vec<DocumentRecord>) -> Vec<DocumentRecord> {
    let ordered = canonical_order(records);
    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .filter(|r| seen.insert(r.sha256.clone()))
        .collect()
}

/// Like [`dedup`] but fails with `DuplicateHash` instead of silently
/// dropping repeats, for pipelines run with no configured deduper (§4.6).
pub fn require_no_duplicates(records: Vec<DocumentRecord>) -> Result<Vec<DocumentRecord>> {
    let ordered = canonical_order(records);
    let mut seen = HashSet::new();
    for record in &ordered {
        if !seen.insert(record.sha256.clone()) {
            return Err(Error::DuplicateHash {
                sha256: record.sha256.clone(),
            });
        }
    }
    Ok(ordered)
}
