//! Dense (embedding) search over an HNSW index (§4.10). Gated behind the
//! online capability since both embedding and ANN-store construction are
//! treated as network-dependent operations here.

use hnsw_rs::prelude::*;

use rexlit_common::context::RexlitContext;
use rexlit_common::error::{Error, Result};

const DEFAULT_MAX_NB_CONNECTION: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_EF_SEARCH: usize = 64;

/// Embeds text into a fixed-width vector. The real adapter (a hosted or
/// local embedding model) lives outside this crate; tests use a stub.
pub trait Embedder: Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DenseResult {
    pub sha256: String,
    pub dense_score: f32,
}

/// An in-memory HNSW store keyed by `sha256`. Persistence to
/// `<data>/index/dense/kanon2_<dim>.hnsw` is the caller's responsibility via
/// `hnsw_rs`'s own file dump/reload, kept out of this wrapper to avoid
/// coupling store layout to this crate's API.
pub struct DenseIndex<'a> {
    hnsw: Hnsw<'a, f32, DistL2>,
    ids: Vec<String>,
}

impl<'a> DenseIndex<'a> {
    pub fn new(expected_capacity: usize) -> Self {
        let hnsw = Hnsw::new(
            DEFAULT_MAX_NB_CONNECTION,
            expected_capacity.max(16),
            16,
            DEFAULT_EF_CONSTRUCTION,
            DistL2 {},
        );
        DenseIndex {
            hnsw,
            ids: Vec::new(),
        }
    }

    /// Embed and insert every `(sha256, text)` pair. Requires the online
    /// gate to be open.
    pub fn build(ctx: &RexlitContext, embedder: &dyn Embedder, documents: &[(String, String)]) -> Result<Self> {
        ctx.require_online("dense_search")?;
        let mut index = DenseIndex::new(documents.len());
        for (sha256, text) in documents {
            let vector = embedder.embed(text)?;
            let internal_id = index.ids.len();
            index.hnsw.insert((&vector, internal_id));
            index.ids.push(sha256.clone());
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Embed `query` and return the top-k nearest documents by ascending
    /// L2 distance, converted to a similarity-style score in `(0, 1]`.
    pub fn search(&self, ctx: &RexlitContext, embedder: &dyn Embedder, query: &str, k: usize) -> Result<Vec<DenseResult>> {
        ctx.require_online("dense_search")?;
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let query_vector = embedder.embed(query)?;
        let neighbors = self.hnsw.search(&query_vector, k, DEFAULT_EF_SEARCH);

        let mut results = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            let Some(sha256) = self.ids.get(neighbor.d_id).cloned() else {
                continue;
            };
            let dense_score = 1.0 / (1.0 + neighbor.distance);
            results.push(DenseResult { sha256, dense_score });
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubEmbedder;
    impl Embedder for StubEmbedder {
        fn dim(&self) -> usize {
            4
        }
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            // Deterministic pseudo-embedding: byte histogram mod a few buckets.
            let mut v = vec![0.0f32; 4];
            for (i, b) in text.bytes().enumerate() {
                v[i % 4] += b as f32;
            }
            Ok(v)
        }
    }

    fn online_ctx() -> RexlitContext {
        let dir = tempfile::tempdir().unwrap();
        RexlitContext::builder().allowed_root(dir.into_path()).online(true).build().unwrap()
    }

    #[test]
    fn dense_search_returns_nearest_by_embedding() {
        let ctx = online_ctx();
        let embedder = StubEmbedder;
        let docs = vec![
            ("a".repeat(64), "privilege review memo".to_string()),
            ("b".repeat(64), "completely different topic".to_string()),
        ];
        let index = DenseIndex::build(&ctx, &embedder, &docs).unwrap();
        assert_eq!(index.len(), 2);

        let results = index.search(&ctx, &embedder, "privilege review memo", 2).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].sha256, "a".repeat(64));
    }

    #[test]
    fn dense_search_requires_online_gate() {
        let dir = tempfile::tempdir().unwrap();
        let offline_ctx = RexlitContext::builder().allowed_root(dir.path()).online(false).build().unwrap();
        let embedder = StubEmbedder;
        let err = DenseIndex::build(&offline_ctx, &embedder, &[]).unwrap_err();
        assert!(matches!(err, Error::OfflineFeatureRequired { .. }));
    }
}
