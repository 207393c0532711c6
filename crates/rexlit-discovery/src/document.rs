//! `DocumentRecord` (§3) and the MIME/doctype/custodian inference that
//! Discovery applies to each file it finds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use rexlit_common::ordering::Ordered;

/// A single discovered document. Produced by Discovery, consumed read-only
/// by every downstream stage (§3 lifecycle).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub sha256: String,
    pub path: String,
    pub size: u64,
    pub mtime: DateTime<Utc>,
    pub mime_type: String,
    pub extension: String,
    pub custodian: Option<String>,
    pub doctype: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Ordered for DocumentRecord {
    fn sha256(&self) -> &str {
        &self.sha256
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn family_key(&self) -> String {
        for key in ["thread_id", "family_id", "conversation_id"] {
            if let Some(value) = self.metadata.get(key).and_then(|v| v.as_str()) {
                return value.to_string();
            }
        }
        self.sha256.clone()
    }
}

/// Lowercased extension (without the leading dot) of `path`, or empty.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// MIME type inferred from extension. Unknown extensions fall back to
/// `application/octet-stream`, matching the MIME-then-extension doctype
/// table's default (§4.6).
pub fn infer_mime_type(extension: &str) -> String {
    match extension {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "eml" => "message/rfc822",
        "msg" => "application/vnd.ms-outlook",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "zip" => "application/zip",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Document type classification, MIME first, falling back to extension
/// (§4.6). Returns `None` when neither table recognizes the input.
pub fn classify_doctype(mime_type: &str, extension: &str) -> Option<String> {
    let doctype = match mime_type {
        "application/pdf" => "pdf",
        "message/rfc822" | "application/vnd.ms-outlook" => "email",
        "text/html" => "html",
        "text/plain" | "text/csv" => "text",
        m if m.starts_with("image/") => "image",
        m if m.contains("spreadsheetml") || m == "application/vnd.ms-excel" => "spreadsheet",
        m if m.contains("presentationml") || m == "application/vnd.ms-powerpoint" => "presentation",
        m if m.contains("wordprocessingml") || m == "application/msword" => "document",
        _ => {
            return match extension {
                "pdf" => Some("pdf".to_string()),
                "eml" | "msg" => Some("email".to_string()),
                "htm" | "html" => Some("html".to_string()),
                "txt" | "csv" => Some("text".to_string()),
                "png" | "jpg" | "jpeg" | "tif" | "tiff" => Some("image".to_string()),
                _ => None,
            };
        }
    };
    Some(doctype.to_string())
}

/// Extract a custodian name from a `.../custodians/<name>/...` or
/// `.../users/<name>/...` path segment, if present (§4.6).
pub fn extract_custodian(path: &Path) -> Option<String> {
    let components: Vec<&str> = path
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();

    for (idx, segment) in components.iter().enumerate() {
        if (*segment == "custodians" || *segment == "users") && idx + 1 < components.len() {
            return Some(components[idx + 1].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_known_mime_types() {
        assert_eq!(infer_mime_type("pdf"), "application/pdf");
        assert_eq!(infer_mime_type("xyz"), "application/octet-stream");
    }

    #[test]
    fn classifies_doctype_by_mime_then_extension() {
        assert_eq!(classify_doctype("application/pdf", "pdf").as_deref(), Some("pdf"));
        assert_eq!(
            classify_doctype("application/octet-stream", "eml").as_deref(),
            Some("email")
        );
        assert_eq!(classify_doctype("application/octet-stream", "bin"), None);
    }

    #[test]
    fn extracts_custodian_from_either_convention() {
        assert_eq!(
            extract_custodian(Path::new("/data/custodians/jsmith/inbox/a.eml")).as_deref(),
            Some("jsmith")
        );
        assert_eq!(
            extract_custodian(Path::new("/data/users/agarcia/doc.pdf")).as_deref(),
            Some("agarcia")
        );
        assert_eq!(extract_custodian(Path::new("/data/misc/a.pdf")), None);
    }

    #[test]
    fn family_key_prefers_thread_then_family_then_conversation_then_self() {
        let mut record = DocumentRecord {
            sha256: "deadbeef".to_string(),
            path: "/a.txt".to_string(),
            size: 1,
            mtime: Utc::now(),
            mime_type: "text/plain".to_string(),
            extension: "txt".to_string(),
            custodian: None,
            doctype: Some("text".to_string()),
            metadata: HashMap::new(),
        };
        assert_eq!(record.family_key(), "deadbeef");

        record
            .metadata
            .insert("conversation_id".to_string(), serde_json::json!("conv-1"));
        assert_eq!(record.family_key(), "conv-1");

        record
            .metadata
            .insert("family_id".to_string(), serde_json::json!("fam-1"));
        assert_eq!(record.family_key(), "fam-1");

        record
            .metadata
            .insert("thread_id".to_string(), serde_json::json!("thread-1"));
        assert_eq!(record.family_key(), "thread-1");
    }
}
