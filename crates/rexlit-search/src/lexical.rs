//! Lexical query execution over the committed index (§4.10).

use std::path::Path;

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::{Index, ReloadPolicy, TantivyDocument};

use rexlit_common::error::{Error, Result};

use crate::schema::{FIELD_BODY, FIELD_CUSTODIAN, FIELD_DOCTYPE, FIELD_METADATA, FIELD_PATH, FIELD_SHA256};

const SNIPPET_WINDOW: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub path: String,
    pub sha256: String,
    pub custodian: Option<String>,
    pub doctype: Option<String>,
    pub score: f32,
    pub snippet: Option<String>,
    pub metadata: Option<String>,
}

fn open_searcher(index_dir: &Path) -> Result<(Index, tantivy::Searcher)> {
    if !index_dir.exists() {
        return Err(Error::NotFound(index_dir.display().to_string()));
    }
    let index = Index::open_in_dir(index_dir).map_err(|e| Error::InvalidFormat(e.to_string()))?;
    let reader = index
        .reader_builder()
        .reload_policy(ReloadPolicy::OnCommitWithDelay)
        .try_into()
        .map_err(|e: tantivy::TantivyError| Error::InvalidFormat(e.to_string()))?;
    let searcher = reader.searcher();
    Ok((index, searcher))
}

fn doc_to_result(index: &Index, doc: &TantivyDocument, score: f32) -> SearchResult {
    let schema = index.schema();
    let get_text = |field_name: &str| -> Option<String> {
        let field = schema.get_field(field_name).ok()?;
        doc.get_first(field)?.as_str().map(|s| s.to_string())
    };

    let path = get_text(FIELD_PATH).unwrap_or_default();
    let sha256 = get_text(FIELD_SHA256).unwrap_or_default();
    let custodian = get_text(FIELD_CUSTODIAN).filter(|s| !s.is_empty());
    let doctype = get_text(FIELD_DOCTYPE).filter(|s| !s.is_empty());
    let metadata = get_text(FIELD_METADATA).filter(|s| !s.is_empty());

    SearchResult {
        path,
        sha256,
        custodian,
        doctype,
        score,
        snippet: None,
        metadata,
    }
}

/// Case-insensitive lexical search over `[body, path, custodian]`,
/// returning the top `limit` results after skipping `offset`.
pub fn search_index(index_dir: &Path, query: &str, limit: usize, offset: usize) -> Result<Vec<SearchResult>> {
    if query.trim().is_empty() {
        return Err(Error::InvalidFormat("query cannot be empty".to_string()));
    }

    let (index, searcher) = open_searcher(index_dir)?;
    let schema = index.schema();
    let fields = [FIELD_BODY, FIELD_PATH, FIELD_CUSTODIAN]
        .iter()
        .map(|name| schema.get_field(name).unwrap())
        .collect::<Vec<_>>();

    let parser = QueryParser::for_index(&index, fields);
    let parsed = parser
        .parse_query(query)
        .map_err(|e| Error::InvalidFormat(format!("invalid query syntax: {e}")))?;

    let top_docs = searcher
        .search(&parsed, &TopDocs::with_limit(limit + offset))
        .map_err(|e| Error::InvalidFormat(e.to_string()))?;

    let mut results = Vec::new();
    for (score, address) in top_docs.into_iter().skip(offset).take(limit) {
        let retrieved: TantivyDocument = searcher
            .doc(address)
            .map_err(|e| Error::InvalidFormat(e.to_string()))?;
        let mut result = doc_to_result(&index, &retrieved, score);
        result.snippet = make_snippet(&retrieved, &schema, query);
        results.push(result);
    }
    Ok(results)
}

/// Nearest char boundary at or before `idx`. `str::is_char_boundary` is
/// stable; the floor/ceil walk it itself isn't, so it's hand-rolled here.
fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Nearest char boundary at or after `idx`.
fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

fn make_snippet(doc: &TantivyDocument, schema: &tantivy::schema::Schema, query: &str) -> Option<String> {
    let field = schema.get_field(FIELD_BODY).ok()?;
    let body = doc.get_first(field)?.as_str()?;
    if body.is_empty() {
        return None;
    }
    let lower_body = body.to_ascii_lowercase();
    let needle = query.split_whitespace().next()?.to_ascii_lowercase();
    let start = lower_body.find(&needle).unwrap_or(0);
    let window_start = floor_char_boundary(body, start.saturating_sub(SNIPPET_WINDOW / 2));
    let window_end = ceil_char_boundary(body, (start + SNIPPET_WINDOW / 2).min(body.len()));
    let mut snippet = body[window_start..window_end].to_string();
    if window_start > 0 {
        snippet = format!("...{snippet}");
    }
    if window_end < body.len() {
        snippet.push_str("...");
    }
    Some(snippet)
}

pub fn search_by_custodian(index_dir: &Path, custodian: &str, limit: usize) -> Result<Vec<SearchResult>> {
    search_index(index_dir, &format!("custodian:{custodian}"), limit, 0)
}

pub fn search_by_doctype(index_dir: &Path, doctype: &str, limit: usize) -> Result<Vec<SearchResult>> {
    search_index(index_dir, &format!("doctype:{doctype}"), limit, 0)
}

pub fn search_by_hash(index_dir: &Path, sha256: &str) -> Result<Option<SearchResult>> {
    let mut results = search_index(index_dir, &format!("sha256:{sha256}"), 1, 0)?;
    Ok(if results.is_empty() { None } else { Some(results.remove(0)) })
}

pub fn count_documents(index_dir: &Path) -> Result<usize> {
    let (_, searcher) = open_searcher(index_dir)?;
    Ok(searcher.num_docs() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{build_index, TextExtractor};
    use rexlit_discovery::document::DocumentRecord;

    struct StubExtractor;
    impl TextExtractor for StubExtractor {
        fn extract(&self, record: &DocumentRecord) -> Result<String> {
            Ok(record.metadata.get("body").and_then(|v| v.as_str()).unwrap_or("").to_string())
        }
    }

    fn record(sha: &str, custodian: &str, body: &str) -> DocumentRecord {
        let mut metadata = std::collections::HashMap::new();
        metadata.insert("body".to_string(), serde_json::json!(body));
        DocumentRecord {
            sha256: sha.to_string(),
            path: format!("/docs/{sha}.txt"),
            size: 10,
            mtime: chrono::Utc::now(),
            mime_type: "text/plain".to_string(),
            extension: "txt".to_string(),
            custodian: Some(custodian.to_string()),
            doctype: Some("email".to_string()),
            metadata,
        }
    }

    #[test]
    fn finds_document_by_body_keyword() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record(&"a".repeat(64), "alice", "the quarterly privilege review is complete"),
            record(&"b".repeat(64), "bob", "unrelated lunch menu"),
        ];
        build_index(dir.path(), &records, &StubExtractor, true).unwrap();

        let results = search_index(dir.path(), "privilege", 10, 0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].custodian.as_deref(), Some("alice"));
    }

    #[test]
    fn search_by_hash_finds_exact_document() {
        let dir = tempfile::tempdir().unwrap();
        let sha = "c".repeat(64);
        let records = vec![record(&sha, "alice", "hello world")];
        build_index(dir.path(), &records, &StubExtractor, true).unwrap();

        let result = search_by_hash(dir.path(), &sha).unwrap();
        assert!(result.is_some());
        assert_eq!(result.unwrap().sha256, sha);
    }

    #[test]
    fn count_documents_matches_indexed_count() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record(&"a".repeat(64), "alice", "x"), record(&"b".repeat(64), "bob", "y")];
        build_index(dir.path(), &records, &StubExtractor, true).unwrap();
        assert_eq!(count_documents(dir.path()).unwrap(), 2);
    }

    #[test]
    fn char_boundary_snapping_never_lands_mid_codepoint() {
        let body = "caf\u{e9} \u{1f600} review"; // multibyte accented char and emoji
        for idx in 0..=body.len() {
            let floored = floor_char_boundary(body, idx);
            let ceiled = ceil_char_boundary(body, idx);
            assert!(body.is_char_boundary(floored));
            assert!(body.is_char_boundary(ceiled));
        }
    }

    #[test]
    fn snippet_does_not_panic_on_multibyte_body_near_match_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = "\u{1f600}".repeat(SNIPPET_WINDOW / 2);
        body.push_str(" privilege ");
        body.push_str(&"\u{e9}".repeat(SNIPPET_WINDOW / 2));
        let records = vec![record(&"d".repeat(64), "alice", &body)];
        build_index(dir.path(), &records, &StubExtractor, true).unwrap();

        let results = search_index(dir.path(), "privilege", 10, 0).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].snippet.is_some());
    }
}
