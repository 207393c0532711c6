//! `validate_pack` (§4.13): re-reads a pack's manifest and confirms every
//! listed artifact is present and readable.

use std::path::Path;

use rexlit_common::error::Result;

use crate::manifest::PackManifest;

/// Returns `true` when `pack_path/manifest.json` parses and every artifact
/// it lists exists and hashes cleanly. Missing manifests, empty manifests,
/// unparseable JSON, and missing/unreadable artifacts all return `false`
/// rather than propagating an error — validation is a yes/no check, not a
/// fallible operation.
pub fn validate_pack(pack_path: &Path) -> bool {
    let manifest_path = pack_path.join("manifest.json");
    let manifest_text = match std::fs::read_to_string(&manifest_path) {
        Ok(text) => text,
        Err(_) => return false,
    };

    if manifest_text.trim().is_empty() {
        return false;
    }

    let manifest: PackManifest = match serde_json::from_str(&manifest_text) {
        Ok(m) => m,
        Err(_) => return false,
    };

    for artifact in &manifest.artifacts {
        let artifact_path = pack_path.join(artifact);
        if !artifact_path.exists() {
            return false;
        }
        if rexlit_common::hash::sha256_file(&artifact_path).is_err() {
            return false;
        }
    }

    true
}

/// Like [`validate_pack`], but returns the list of human-readable failure
/// reasons instead of collapsing to a bool, for callers that want to audit
/// the specific artifacts that failed.
pub fn validate_pack_report(pack_path: &Path) -> Result<(bool, Vec<String>)> {
    let manifest_path = pack_path.join("manifest.json");
    let manifest_text = match std::fs::read_to_string(&manifest_path) {
        Ok(text) => text,
        Err(_) => return Ok((false, vec!["manifest file not found".to_string()])),
    };

    if manifest_text.trim().is_empty() {
        return Ok((false, vec!["empty manifest file".to_string()]));
    }

    let manifest: PackManifest = match serde_json::from_str(&manifest_text) {
        Ok(m) => m,
        Err(e) => return Ok((false, vec![e.to_string()])),
    };

    let mut failures = Vec::new();
    for artifact in &manifest.artifacts {
        let artifact_path = pack_path.join(artifact);
        if !artifact_path.exists() {
            failures.push(format!("missing artifact: {artifact}"));
            continue;
        }
        if let Err(e) = rexlit_common::hash::sha256_file(&artifact_path) {
            failures.push(format!("cannot compute hash for {artifact}: {e}"));
        }
    }

    Ok((failures.is_empty(), failures))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, manifest: &PackManifest) {
        std::fs::write(dir.join("manifest.json"), serde_json::to_string_pretty(manifest).unwrap()).unwrap();
    }

    #[test]
    fn valid_pack_with_no_artifacts_passes() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = PackManifest {
            pack_id: "pack_test_empty".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            document_count: 0,
            total_pages: 0,
            bates_range: None,
            redaction_count: 0,
            artifacts: vec![],
        };
        write_manifest(dir.path(), &manifest);
        assert!(validate_pack(dir.path()));
    }

    #[test]
    fn missing_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!validate_pack(dir.path()));
        let (ok, failures) = validate_pack_report(dir.path()).unwrap();
        assert!(!ok);
        assert_eq!(failures, vec!["manifest file not found".to_string()]);
    }

    #[test]
    fn missing_artifact_fails_and_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = PackManifest {
            pack_id: "pack_test_missing".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            document_count: 1,
            total_pages: 1,
            bates_range: None,
            redaction_count: 0,
            artifacts: vec!["natives/missing.pdf".to_string()],
        };
        write_manifest(dir.path(), &manifest);
        assert!(!validate_pack(dir.path()));
        let (ok, failures) = validate_pack_report(dir.path()).unwrap();
        assert!(!ok);
        assert_eq!(failures, vec!["missing artifact: natives/missing.pdf".to_string()]);
    }
}
