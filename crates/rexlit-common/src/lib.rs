//! Shared primitives for rexlit: errors, content hashing, canonical JSON,
//! schema stamping, deterministic ordering, and the bootstrap context.

pub mod canonical;
pub mod context;
pub mod error;
pub mod hash;
pub mod ordering;
pub mod schema;

pub use canonical::{canonical_json, sorted_join_hash};
pub use context::{RexlitContext, RexlitContextBuilder};
pub use error::{Error, ErrorCategory, Result, StructuredError, SuggestedAction};
pub use hash::{sha256_bytes, sha256_file, verify_file_hash};
pub use ordering::{canonical_order, family_grouped_order, Ordered};
pub use schema::{stamp_record, MigrationRegistry, MigrationStep, SchemaStamp};
