//! `export_load_file` (§4.13): render a pack's document metadata as a DAT
//! or Opticon production load file.

use std::path::{Path, PathBuf};

use rexlit_common::error::{Error, Result};
use rexlit_discovery::DocumentRecord;

const DAT_FIELDS: &[&str] = &[
    "DOCID", "BEGDOC", "ENDDOC", "CUSTODIAN", "DOCTYPE", "FILEPATH", "FILEEXT", "FILESIZE", "DATEMODIFIED", "SHA256",
];

fn escape_pipe(value: &str) -> String {
    value.replace('|', "\\|")
}

fn dat_field(record: &DocumentRecord, field: &str) -> String {
    match field {
        "DOCID" | "BEGDOC" | "ENDDOC" | "SHA256" => record.sha256.clone(),
        "CUSTODIAN" => record.custodian.clone().unwrap_or_default(),
        "DOCTYPE" => record.doctype.clone().unwrap_or_default(),
        "FILEPATH" => record.path.clone(),
        "FILEEXT" => record.extension.clone(),
        "FILESIZE" => record.size.to_string(),
        "DATEMODIFIED" => record.mtime.to_rfc3339(),
        _ => String::new(),
    }
}

fn render_dat(records: &[DocumentRecord]) -> String {
    let mut lines = vec![DAT_FIELDS.join("|")];
    for record in records {
        let row: Vec<String> = DAT_FIELDS.iter().map(|f| escape_pipe(&dat_field(record, f))).collect();
        lines.push(row.join("|"));
    }
    lines.join("\n") + "\n"
}

fn bates_label(record: &DocumentRecord) -> String {
    record
        .metadata
        .get("bates_id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| record.sha256.clone())
}

fn render_opticon(records: &[DocumentRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() * 6);
    for record in records {
        lines.push("IMAGE".to_string());
        lines.push(bates_label(record));
        lines.push(record.path.clone());
        lines.push("Y".to_string());
        lines.push("1".to_string());
        lines.push(String::new());
    }
    lines.join("\n") + "\n"
}

/// Read a pack's `metadata/documents.jsonl` and render it as a load file.
/// Only `dat` and `opticon` are implemented; `lfp` is a recognized but
/// unimplemented format; anything else is rejected outright.
pub fn export_load_file(pack_path: &Path, output_path: &Path, format: &str) -> Result<PathBuf> {
    const SUPPORTED: &[&str] = &["dat", "opticon", "lfp"];
    if !SUPPORTED.contains(&format) {
        return Err(Error::InvalidFormat(format!(
            "unsupported load file format '{format}', expected one of dat, opticon, lfp"
        )));
    }
    if format == "lfp" {
        return Err(Error::NotImplemented(
            "load file format 'lfp' is not yet implemented".to_string(),
        ));
    }

    let metadata_jsonl = pack_path.join("metadata").join("documents.jsonl");
    if !metadata_jsonl.exists() {
        return Err(Error::NotFound(metadata_jsonl.display().to_string()));
    }
    let lines = rexlit_jsonl::read_lines(&metadata_jsonl)?;
    if lines.is_empty() {
        return Err(Error::NotFound(format!("pack metadata is empty: {}", metadata_jsonl.display())));
    }
    let records: Vec<DocumentRecord> = lines
        .iter()
        .map(|line| serde_json::from_str(line).map_err(Error::Json))
        .collect::<Result<_>>()?;

    let content = match format {
        "dat" => render_dat(&records),
        "opticon" => render_opticon(&records),
        _ => unreachable!(),
    };

    if let Some(dir) = output_path.parent() {
        std::fs::create_dir_all(dir).map_err(Error::Io)?;
    }
    std::fs::write(output_path, content).map_err(Error::Io)?;

    Ok(output_path.to_path_buf())
}
