//! Lexical index build (§4.10): discovery feeds a bounded worker pool that
//! extracts text and reports back to a single committing writer.

use std::path::Path;

use rayon::prelude::*;
use tantivy::{doc, Index, IndexWriter};

use rexlit_common::error::{Error, Result};
use rexlit_discovery::document::DocumentRecord;

use crate::metadata_cache::MetadataCache;
use crate::schema::{build_schema, FIELD_BODY, FIELD_CUSTODIAN, FIELD_DOCTYPE, FIELD_METADATA, FIELD_PATH, FIELD_SHA256};

const COMMIT_BATCH_SIZE: usize = 1000;
const WRITER_HEAP_BYTES: usize = 200_000_000;

/// Extracts plain text from a document for indexing. The real adapter lives
/// outside this crate (PDF/OCR/office-format extraction); tests use a stub.
pub trait TextExtractor: Sync {
    fn extract(&self, record: &DocumentRecord) -> Result<String>;
}

struct ExtractedPayload {
    record: DocumentRecord,
    text: String,
}

/// Build (or rebuild) a lexical index from `records` into `index_dir`.
/// Returns the number of documents successfully indexed; extraction
/// failures are skipped and logged, not propagated.
pub fn build_index(
    index_dir: &Path,
    records: &[DocumentRecord],
    extractor: &dyn TextExtractor,
    rebuild: bool,
) -> Result<usize> {
    if rebuild && index_dir.exists() {
        std::fs::remove_dir_all(index_dir).map_err(Error::Io)?;
    }
    std::fs::create_dir_all(index_dir).map_err(Error::Io)?;

    let mut metadata_cache = MetadataCache::open(index_dir);
    if rebuild {
        metadata_cache.reset();
    }

    let schema = build_schema();
    let index = Index::create_in_dir(index_dir, schema.clone())
        .or_else(|_| Index::open_in_dir(index_dir))
        .map_err(|e| Error::InvalidFormat(e.to_string()))?;

    let payloads: Vec<ExtractedPayload> = records
        .par_iter()
        .filter_map(|record| match extractor.extract(record) {
            Ok(text) => Some(ExtractedPayload {
                record: record.clone(),
                text,
            }),
            Err(e) => {
                tracing::warn!(path = %record.path, error = %e, "skipping document: extraction failed");
                None
            }
        })
        .collect();

    let path_field = schema.get_field(FIELD_PATH).unwrap();
    let sha256_field = schema.get_field(FIELD_SHA256).unwrap();
    let custodian_field = schema.get_field(FIELD_CUSTODIAN).unwrap();
    let doctype_field = schema.get_field(FIELD_DOCTYPE).unwrap();
    let body_field = schema.get_field(FIELD_BODY).unwrap();
    let metadata_field = schema.get_field(FIELD_METADATA).unwrap();

    let mut writer: IndexWriter = index
        .writer(WRITER_HEAP_BYTES as u64)
        .map_err(|e| Error::InvalidFormat(e.to_string()))?;

    let mut indexed = 0usize;
    for payload in &payloads {
        let custodian = payload.record.custodian.clone().unwrap_or_default();
        let doctype = payload.record.doctype.clone().unwrap_or_else(|| "unknown".to_string());
        let metadata_blob = serde_json::to_string(&payload.record.metadata).unwrap_or_default();

        writer
            .add_document(doc!(
                path_field => payload.record.path.clone(),
                sha256_field => payload.record.sha256.clone(),
                custodian_field => custodian.clone(),
                doctype_field => doctype.clone(),
                body_field => payload.text.clone(),
                metadata_field => metadata_blob,
            ))
            .map_err(|e| Error::InvalidFormat(e.to_string()))?;

        metadata_cache.update(Some(&custodian), Some(&doctype));
        indexed += 1;

        if indexed % COMMIT_BATCH_SIZE == 0 {
            writer.commit().map_err(|e| Error::InvalidFormat(e.to_string()))?;
            tracing::info!(indexed, total = records.len(), "index commit checkpoint");
        }
    }

    writer.commit().map_err(|e| Error::InvalidFormat(e.to_string()))?;
    metadata_cache.save()?;

    tracing::info!(indexed, skipped = records.len() - indexed, "lexical index build complete");
    Ok(indexed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rexlit_discovery::document::DocumentRecord;

    struct StubExtractor;
    impl TextExtractor for StubExtractor {
        fn extract(&self, record: &DocumentRecord) -> Result<String> {
            Ok(format!("body for {}", record.sha256))
        }
    }

    fn record(sha: &str, custodian: &str) -> DocumentRecord {
        DocumentRecord {
            sha256: sha.to_string(),
            path: format!("/docs/{sha}.txt"),
            size: 10,
            mtime: chrono::Utc::now(),
            mime_type: "text/plain".to_string(),
            extension: "txt".to_string(),
            custodian: Some(custodian.to_string()),
            doctype: Some("email".to_string()),
            metadata: Default::default(),
        }
    }

    #[test]
    fn build_index_indexes_all_documents() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("a".repeat(64).as_str(), "alice"), record("b".repeat(64).as_str(), "bob")];
        let count = build_index(dir.path(), &records, &StubExtractor, true).unwrap();
        assert_eq!(count, 2);

        let cache = MetadataCache::open(dir.path());
        assert_eq!(cache.doc_count(), 2);
    }
}
