//! Persisted sidecar cache of custodians/doctypes/doc_count, so metadata
//! queries don't require a full index scan (§4.10).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use rexlit_common::error::Result;

const CACHE_FILE_NAME: &str = ".metadata_cache.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CachePayload {
    custodians: Vec<String>,
    doctypes: Vec<String>,
    doc_count: usize,
}

/// In-memory metadata cache, owned by the index writer during a build and
/// persisted atomically at commit.
pub struct MetadataCache {
    cache_path: PathBuf,
    custodians: BTreeSet<String>,
    doctypes: BTreeSet<String>,
    doc_count: usize,
}

impl MetadataCache {
    pub fn open(index_dir: &Path) -> Self {
        let cache_path = index_dir.join(CACHE_FILE_NAME);
        let payload = Self::load(&cache_path);
        MetadataCache {
            cache_path,
            custodians: payload.custodians.into_iter().collect(),
            doctypes: payload.doctypes.into_iter().collect(),
            doc_count: payload.doc_count,
        }
    }

    /// Load from disk; if the file is missing or fails to parse, the prior
    /// content is preserved under a `.corrupt` suffix and an empty cache is
    /// returned rather than failing the caller.
    fn load(cache_path: &Path) -> CachePayload {
        let Ok(raw) = std::fs::read_to_string(cache_path) else {
            return CachePayload::default();
        };
        match serde_json::from_str::<CachePayload>(&raw) {
            Ok(payload) => payload,
            Err(reason) => {
                tracing::warn!(path = %cache_path.display(), %reason, "metadata cache corrupted, rebuilding");
                let backup = cache_path.with_extension("corrupt");
                let _ = std::fs::rename(cache_path, backup);
                CachePayload::default()
            }
        }
    }

    pub fn reset(&mut self) {
        self.custodians.clear();
        self.doctypes.clear();
        self.doc_count = 0;
    }

    pub fn update(&mut self, custodian: Option<&str>, doctype: Option<&str>) {
        if let Some(c) = custodian {
            if !c.is_empty() {
                self.custodians.insert(c.to_string());
            }
        }
        if let Some(d) = doctype {
            if !d.is_empty() && d != "unknown" {
                self.doctypes.insert(d.to_string());
            }
        }
        self.doc_count += 1;
    }

    /// Persisted atomically (tmpfile -> fsync -> rename) so a crash
    /// mid-write never leaves a truncated cache for [`Self::load`] to find.
    pub fn save(&self) -> Result<()> {
        let payload = CachePayload {
            custodians: self.custodians.iter().cloned().collect(),
            doctypes: self.doctypes.iter().cloned().collect(),
            doc_count: self.doc_count,
        };
        rexlit_jsonl::write_json_atomic(&self.cache_path, &payload)
    }

    pub fn custodians(&self) -> BTreeSet<String> {
        self.custodians.clone()
    }

    pub fn doctypes(&self) -> BTreeSet<String> {
        self.doctypes.clone()
    }

    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    pub fn exists(&self) -> bool {
        self.cache_path.exists()
    }
}
