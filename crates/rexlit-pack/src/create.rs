//! `create_pack` (§4.13): walks a processed-document tree and assembles a
//! deterministic `natives/` + `text/` + `metadata/` production package.

use std::path::{Path, PathBuf};

use chrono::Utc;

use rexlit_common::error::{Error, Result};
use rexlit_common::ordering::canonical_order;
use rexlit_discovery::DocumentRecord;

use crate::manifest::PackManifest;

#[derive(Debug, Clone, Copy)]
pub struct PackOptions {
    pub include_natives: bool,
    pub include_text: bool,
    pub include_metadata: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        PackOptions {
            include_natives: true,
            include_text: true,
            include_metadata: true,
        }
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy().into_owned();
    path.with_file_name(format!("{stem}.{suffix}"))
}

fn native_dest_name(record: &DocumentRecord) -> String {
    if record.extension.is_empty() {
        record.sha256.clone()
    } else {
        format!("{}.{}", record.sha256, record.extension)
    }
}

/// Build a production package from `input`'s processed documents into
/// `output`, copying native files / extracted text / a metadata JSONL as
/// requested and returning the manifest written to `output/manifest.json`.
pub fn create_pack(input: &Path, output: &Path, options: &PackOptions) -> Result<PackManifest> {
    let documents = canonical_order(rexlit_discovery::discover(input, &rexlit_paths::ExtensionFilter::default())?);

    std::fs::create_dir_all(output).map_err(Error::Io)?;
    let natives_dir = output.join("natives");
    let text_dir = output.join("text");
    let metadata_dir = output.join("metadata");

    if options.include_natives {
        std::fs::create_dir_all(&natives_dir).map_err(Error::Io)?;
    }
    if options.include_text {
        std::fs::create_dir_all(&text_dir).map_err(Error::Io)?;
    }
    if options.include_metadata {
        std::fs::create_dir_all(&metadata_dir).map_err(Error::Io)?;
    }

    let mut artifacts = Vec::new();
    let mut document_count = 0usize;
    let mut total_pages = 0u64;
    let mut redaction_count = 0usize;
    let mut metadata_records = Vec::with_capacity(documents.len());

    for record in &documents {
        document_count += 1;
        let doc_path = Path::new(&record.path);

        if options.include_natives && doc_path.exists() {
            let dest = natives_dir.join(native_dest_name(record));
            match std::fs::copy(doc_path, &dest) {
                Ok(_) => {
                    if let Ok(rel) = dest.strip_prefix(output) {
                        artifacts.push(rel.to_string_lossy().into_owned());
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %doc_path.display(), error = %e, "failed to copy native file into pack");
                }
            }
        }

        if options.include_text {
            let text_file = sibling_with_suffix(doc_path, "txt");
            if text_file.exists() {
                let dest = text_dir.join(format!("{}.txt", record.sha256));
                if std::fs::copy(&text_file, &dest).is_ok() {
                    if let Ok(rel) = dest.strip_prefix(output) {
                        artifacts.push(rel.to_string_lossy().into_owned());
                    }
                }
            }
        }

        if record.doctype.as_deref() == Some("pdf") {
            total_pages += (record.size / 50_000).max(1);
        }

        let redaction_plan = sibling_with_suffix(doc_path, "redaction-plan.enc");
        if redaction_plan.exists() {
            redaction_count += 1;
        }

        metadata_records.push(record.clone());
    }

    if options.include_metadata && !metadata_records.is_empty() {
        let metadata_jsonl = metadata_dir.join("documents.jsonl");
        match rexlit_jsonl::write_jsonl_atomic(&metadata_jsonl, &metadata_records) {
            Ok(()) => {
                if let Ok(rel) = metadata_jsonl.strip_prefix(output) {
                    artifacts.push(rel.to_string_lossy().into_owned());
                }
            }
            Err(e) => {
                tracing::warn!(path = %metadata_jsonl.display(), error = %e, "failed to write pack metadata jsonl");
            }
        }
    }

    let created_at = Utc::now().to_rfc3339();
    let input_name = input.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let pack_id = format!("pack_{input_name}_{}", Utc::now().format("%Y%m%d_%H%M%S"));

    let bates_range = read_bates_range(input).ok().flatten();

    artifacts.sort();

    let manifest = PackManifest {
        pack_id,
        created_at,
        document_count,
        total_pages,
        bates_range,
        redaction_count,
        artifacts,
    };

    let manifest_path = output.join("manifest.json");
    let manifest_json = serde_json::to_string_pretty(&manifest).map_err(Error::Json)?;
    std::fs::write(&manifest_path, manifest_json).map_err(Error::Io)?;

    Ok(manifest)
}

/// Best-effort first/last Bates label lookup from `input/bates_plan.jsonl`,
/// if one exists alongside the processed documents.
fn read_bates_range(input: &Path) -> Result<Option<String>> {
    let plan_path = input.join("bates_plan.jsonl");
    if !plan_path.exists() {
        return Ok(None);
    }
    let lines = rexlit_jsonl::read_lines(&plan_path)?;
    let assignments: Vec<rexlit_bates::BatesAssignment> =
        lines.iter().filter_map(|line| serde_json::from_str(line).ok()).collect();
    match (assignments.first(), assignments.last()) {
        (Some(first), Some(last)) => Ok(Some(format!("{}-{}", first.bates_id, last.bates_id))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_pack_with_natives_text_and_metadata() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        std::fs::write(input.path().join("memo.txt"), b"attorney client privileged memo").unwrap();
        std::fs::write(input.path().join("memo.redaction-plan.enc"), b"sealed").unwrap();

        let manifest = create_pack(input.path(), output.path(), &PackOptions::default()).unwrap();

        assert_eq!(manifest.document_count, 1);
        assert_eq!(manifest.redaction_count, 1);
        assert!(manifest.artifacts.iter().any(|a| a.starts_with("natives/")));
        assert!(manifest.artifacts.iter().any(|a| a.starts_with("metadata/documents.jsonl")));
        assert!(output.path().join("manifest.json").exists());
    }

    #[test]
    fn artifacts_are_sorted_for_determinism() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("z.txt"), b"zzz").unwrap();
        std::fs::write(input.path().join("a.txt"), b"aaa").unwrap();

        let manifest = create_pack(input.path(), output.path(), &PackOptions::default()).unwrap();
        let mut sorted = manifest.artifacts.clone();
        sorted.sort();
        assert_eq!(manifest.artifacts, sorted);
    }

    #[test]
    fn pdf_documents_estimate_total_pages_from_size() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("doc.pdf"), vec![b'%'; 200_000]).unwrap();

        let manifest = create_pack(input.path(), output.path(), &PackOptions::default()).unwrap();
        assert_eq!(manifest.total_pages, 4);
    }
}
