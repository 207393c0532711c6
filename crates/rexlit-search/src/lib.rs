//! Lexical full-text search, dense HNSW search, and hybrid fusion (C14).

pub mod build;
pub mod dense;
pub mod hybrid;
pub mod lexical;
pub mod metadata_cache;
pub mod schema;

pub use build::{build_index, TextExtractor};
pub use dense::{DenseIndex, DenseResult, Embedder};
pub use hybrid::{reciprocal_rank_fusion, HybridResult, DEFAULT_RRF_K};
pub use lexical::{count_documents, search_by_custodian, search_by_doctype, search_by_hash, search_index, SearchResult};
pub use metadata_cache::MetadataCache;
pub use schema::{build_schema, SearchDocument};
