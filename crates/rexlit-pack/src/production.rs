//! `create_production` (§4.13): render a DAT or Opticon load file directly
//! from a Bates-stamping manifest, independent of the `create_pack` layout.

use std::path::{Path, PathBuf};

use serde_json::Value;

use rexlit_common::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct ProductionResult {
    pub output_path: PathBuf,
    pub document_count: usize,
    pub format: String,
    pub manifest_path: PathBuf,
}

fn field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| record.get(*k))
}

fn field_str(record: &Value, keys: &[&str]) -> String {
    field(record, keys).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn field_u64(record: &Value, keys: &[&str]) -> u64 {
    field(record, keys).and_then(Value::as_u64).unwrap_or(0)
}

fn relative_path(raw: &str, base: &Path) -> String {
    let path = Path::new(raw);
    match path.strip_prefix(base) {
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) => path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| raw.to_string()),
    }
}

fn render_dat(records: &[Value], base_dir: &Path) -> String {
    let mut sorted: Vec<&Value> = records.iter().collect();
    sorted.sort_by_key(|r| field_str(r, &["start_label"]));

    let mut lines = vec!["DOCID|BEGDOC|ENDDOC|PAGECOUNT|FILEPATH|SHA256".to_string()];
    for record in sorted {
        let start_label = field_str(record, &["start_label", "label"]);
        let end_label_raw = field_str(record, &["end_label"]);
        let end_label = if end_label_raw.is_empty() { start_label.clone() } else { end_label_raw };
        let page_count = field_u64(record, &["pages_stamped", "page_count"]);
        let path_raw = field_str(record, &["output_path", "path"]);
        let sha256 = field_str(record, &["output_sha256", "sha256"]);
        let rel = relative_path(&path_raw, base_dir).replace('|', "\\|");

        lines.push(format!("{start_label}|{start_label}|{end_label}|{page_count}|{rel}|{sha256}"));
    }
    lines.join("\n") + "\n"
}

fn render_opticon(records: &[Value], base_dir: &Path) -> String {
    let mut sorted: Vec<&Value> = records.iter().collect();
    sorted.sort_by_key(|r| field_str(r, &["start_label"]));

    let mut lines = Vec::with_capacity(sorted.len() * 6);
    for record in sorted {
        let start_label = field_str(record, &["start_label", "label"]);
        let path_raw = field_str(record, &["output_path", "path"]);
        let page_count = field_u64(record, &["pages_stamped", "page_count"]);
        let rel = relative_path(&path_raw, base_dir);

        lines.push("IMAGE".to_string());
        lines.push(start_label);
        lines.push(rel);
        lines.push("Y".to_string());
        lines.push(page_count.to_string());
        lines.push(String::new());
    }
    lines.join("\n") + "\n"
}

/// Build a DAT or Opticon production load file from `stamped_dir`'s
/// `bates_manifest.jsonl`. `bates_prefix`, if given, must match every
/// assigned label's prefix or the call fails before any output is written.
pub fn create_production(
    stamped_dir: &Path,
    name: &str,
    format: &str,
    bates_prefix: Option<&str>,
    output_dir: Option<&Path>,
) -> Result<ProductionResult> {
    if !stamped_dir.is_dir() {
        return Err(Error::NotFound(stamped_dir.display().to_string()));
    }

    let manifest_path = stamped_dir.join("bates_manifest.jsonl");
    if !manifest_path.exists() {
        return Err(Error::NotFound(manifest_path.display().to_string()));
    }

    let lines = rexlit_jsonl::read_lines(&manifest_path)?;
    if lines.is_empty() {
        return Err(Error::NotFound(format!("bates stamping manifest is empty: {}", manifest_path.display())));
    }
    let records: Vec<Value> = lines.iter().map(|line| serde_json::from_str(line).map_err(Error::Json)).collect::<Result<_>>()?;

    if let Some(prefix) = bates_prefix {
        if !prefix.is_empty() {
            let mismatch = records.iter().any(|r| !field_str(r, &["start_label"]).starts_with(prefix));
            if mismatch {
                return Err(Error::InvalidFormat(
                    "bates manifest contains labels that do not match the expected prefix".to_string(),
                ));
            }
        }
    }

    let normalized = format.to_lowercase();
    if normalized != "dat" && normalized != "opticon" {
        return Err(Error::InvalidFormat(format!("unsupported production format '{format}', expected dat or opticon")));
    }

    let output_root = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => stamped_dir.join("production").join(name),
    };
    std::fs::create_dir_all(&output_root).map_err(Error::Io)?;

    let (output_path, content) = if normalized == "dat" {
        (output_root.join(format!("{name}.dat")), render_dat(&records, stamped_dir))
    } else {
        (output_root.join(format!("{name}.opt")), render_opticon(&records, stamped_dir))
    };

    std::fs::write(&output_path, content).map_err(Error::Io)?;

    Ok(ProductionResult {
        output_path,
        document_count: records.len(),
        format: normalized,
        manifest_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_manifest(dir: &Path, records: &[Value]) {
        let lines: Vec<String> = records.iter().map(|r| r.to_string()).collect();
        std::fs::write(dir.join("bates_manifest.jsonl"), lines.join("\n") + "\n").unwrap();
    }

    #[test]
    fn renders_dat_production_sorted_by_label() {
        let stamped = tempfile::tempdir().unwrap();
        write_manifest(
            stamped.path(),
            &[
                json!({"start_label": "PROD0002", "end_label": "PROD0002", "pages_stamped": 1, "output_path": "b.pdf", "output_sha256": "bb"}),
                json!({"start_label": "PROD0001", "end_label": "PROD0001", "pages_stamped": 2, "output_path": "a.pdf", "output_sha256": "aa"}),
            ],
        );

        let result = create_production(stamped.path(), "prod1", "dat", None, None).unwrap();
        assert_eq!(result.document_count, 2);
        let content = std::fs::read_to_string(&result.output_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].starts_with("PROD0001"));
        assert!(lines[1].starts_with("PROD0002"));
    }

    #[test]
    fn rejects_prefix_mismatch() {
        let stamped = tempfile::tempdir().unwrap();
        write_manifest(
            stamped.path(),
            &[json!({"start_label": "OTHER0001", "output_path": "a.pdf", "output_sha256": "aa"})],
        );

        let err = create_production(stamped.path(), "prod1", "dat", Some("PROD"), None).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn missing_manifest_is_not_found() {
        let stamped = tempfile::tempdir().unwrap();
        let err = create_production(stamped.path(), "prod1", "dat", None, None).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
