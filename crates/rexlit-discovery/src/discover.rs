//! Discovery (C8): walk a root, lazily producing `DocumentRecord`s.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;

use rexlit_common::error::{Error, Result};
use rexlit_common::hash::sha256_file;
use rexlit_paths::{walk_tree, ExtensionFilter};

use crate::document::{classify_doctype, extension_of, extract_custodian, infer_mime_type, DocumentRecord};

/// Walk `root` recursively and stat + hash every file passing `filter`,
/// returning `DocumentRecord`s in no particular order (callers canonicalize
/// via `rexlit_common::ordering` before persisting a manifest).
pub fn discover(root: &Path, filter: &ExtensionFilter) -> Result<Vec<DocumentRecord>> {
    let paths = walk_tree(root, filter)?;
    let mut records = Vec::with_capacity(paths.len());

    for path in paths {
        let metadata = std::fs::metadata(&path).map_err(Error::Io)?;
        let mtime: DateTime<Utc> = metadata.modified().map_err(Error::Io)?.into();
        let extension = extension_of(&path);
        let mime_type = infer_mime_type(&extension);
        let doctype = classify_doctype(&mime_type, &extension);
        let custodian = extract_custodian(&path);
        let sha256 = sha256_file(&path)?;

        records.push(DocumentRecord {
            sha256,
            path: path.display().to_string(),
            size: metadata.len(),
            mtime,
            mime_type,
            extension,
            custodian,
            doctype,
            metadata: HashMap::new(),
        });
    }

    tracing::info!(root = %root.display(), count = records.len(), "discovery complete");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_and_classifies_custodian_documents() {
        let dir = tempfile::tempdir().unwrap();
        let custodian_dir = dir.path().join("custodians/jsmith");
        fs::create_dir_all(&custodian_dir).unwrap();
        fs::write(custodian_dir.join("memo.pdf"), b"%PDF-1.4 body").unwrap();

        let records = discover(dir.path(), &ExtensionFilter::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].custodian.as_deref(), Some("jsmith"));
        assert_eq!(records[0].doctype.as_deref(), Some("pdf"));
        assert_eq!(records[0].mime_type, "application/pdf");
        assert_eq!(records[0].sha256.len(), 64);
    }

    #[test]
    fn discovers_zero_files_on_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let records = discover(dir.path(), &ExtensionFilter::default()).unwrap();
        assert!(records.is_empty());
    }
}
