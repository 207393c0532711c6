//! Encrypted plan file I/O (§4.7): build → encrypt → atomic single-line
//! write; idempotent rewrite on fingerprint match, hard failure otherwise.

use std::path::Path;

use rexlit_common::canonical::canonical_json;
use rexlit_common::error::{Error, Result};
use rexlit_crypto::{aead, KeyMaterial};
use rexlit_jsonl::{append_line_fsync, read_lines};

use crate::plan::{HighlightPlanEntry, RedactionPlanEntry};

/// Load a sealed redaction plan file. A file holding more than one
/// non-empty line is a hard `SchemaValidation` error (§4.7 format decision)
/// rather than being tolerated as multi-line/mixed-plaintext.
pub fn load_redaction_plan(path: &Path, key: &KeyMaterial) -> Result<Option<RedactionPlanEntry>> {
    load_single_line(path, key)
}

pub fn load_highlight_plan(path: &Path, key: &KeyMaterial) -> Result<Option<HighlightPlanEntry>> {
    load_single_line(path, key)
}

fn load_single_line<T: serde::de::DeserializeOwned>(path: &Path, key: &KeyMaterial) -> Result<Option<T>> {
    let lines = read_lines(path)?;
    match lines.len() {
        0 => Ok(None),
        1 => {
            let plaintext = aead::open(key, &lines[0])?;
            serde_json::from_slice(&plaintext).map(Some).map_err(Error::Json)
        }
        n => Err(Error::SchemaValidation {
            schema_id: "redaction_plan".to_string(),
            reason: format!("expected exactly one sealed line, found {n}"),
        }),
    }
}

/// Write a redaction plan: if one already exists at `path`, require
/// `plan_id` equality for an idempotent no-op, else fail
/// `PlanFingerprintMismatch` (Invariant I3). Otherwise seal and write fresh.
pub fn write_redaction_plan(path: &Path, entry: &RedactionPlanEntry, key: &KeyMaterial) -> Result<()> {
    if let Some(existing) = load_redaction_plan(path, key)? {
        if existing.plan_id == entry.plan_id {
            tracing::info!(plan_id = %entry.plan_id, "redaction plan unchanged, no-op");
            return Ok(());
        }
        return Err(Error::PlanFingerprintMismatch {
            path: path.display().to_string(),
            expected: existing.plan_id,
            actual: entry.plan_id.clone(),
        });
    }
    seal_and_write(path, entry, key)
}

pub fn write_highlight_plan(path: &Path, entry: &HighlightPlanEntry, key: &KeyMaterial) -> Result<()> {
    if let Some(existing) = load_highlight_plan(path, key)? {
        if existing.plan_id == entry.plan_id {
            tracing::info!(plan_id = %entry.plan_id, "highlight plan unchanged, no-op");
            return Ok(());
        }
        return Err(Error::PlanFingerprintMismatch {
            path: path.display().to_string(),
            expected: existing.plan_id,
            actual: entry.plan_id.clone(),
        });
    }
    seal_and_write(path, entry, key)
}

fn seal_and_write<T: serde::Serialize>(path: &Path, entry: &T, key: &KeyMaterial) -> Result<()> {
    let plaintext = canonical_json(entry)?;
    let token = aead::seal(key, plaintext.as_bytes())?;
    // A plan file holds exactly one line; truncate any stale content first
    // by writing through a fresh file rather than the append helper.
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(Error::Io)?;
    }
    std::fs::write(path, b"").map_err(Error::Io)?;
    append_line_fsync(path, &token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::RedactionAction;

    fn sample_entry(end: usize) -> RedactionPlanEntry {
        RedactionPlanEntry::new(
            "/docs/a.txt".to_string(),
            "deadbeef".to_string(),
            vec![RedactionAction {
                action_type: "redact".to_string(),
                category: "SSN".to_string(),
                start: 0,
                end,
                page: None,
                confidence: 0.9,
                replacement: "[SSN]".to_string(),
            }],
            None,
        )
        .unwrap()
    }

    #[test]
    fn write_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.plan");
        let key = KeyMaterial::generate().unwrap();
        let entry = sample_entry(9);

        write_redaction_plan(&path, &entry, &key).unwrap();
        let loaded = load_redaction_plan(&path, &key).unwrap().unwrap();
        assert_eq!(loaded, entry);
    }

    #[test]
    fn rewriting_same_plan_is_idempotent_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.plan");
        let key = KeyMaterial::generate().unwrap();
        let entry = sample_entry(9);

        write_redaction_plan(&path, &entry, &key).unwrap();
        write_redaction_plan(&path, &entry, &key).unwrap();

        let lines = read_lines(&path).unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn rewriting_with_different_content_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.plan");
        let key = KeyMaterial::generate().unwrap();

        write_redaction_plan(&path, &sample_entry(9), &key).unwrap();
        let err = write_redaction_plan(&path, &sample_entry(12), &key).unwrap_err();
        assert!(matches!(err, Error::PlanFingerprintMismatch { .. }));
    }

    #[test]
    fn multi_line_plan_file_is_schema_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.plan");
        let key = KeyMaterial::generate().unwrap();

        let token_a = aead::seal(&key, b"{}").unwrap();
        let token_b = aead::seal(&key, b"{}").unwrap();
        std::fs::write(&path, format!("{token_a}\n{token_b}\n")).unwrap();

        let err = load_redaction_plan(&path, &key).unwrap_err();
        assert!(matches!(err, Error::SchemaValidation { .. }));
    }

    #[test]
    fn loading_missing_plan_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.plan");
        let key = KeyMaterial::generate().unwrap();
        assert!(load_redaction_plan(&path, &key).unwrap().is_none());
    }
}
