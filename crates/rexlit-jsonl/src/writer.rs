//! Atomic JSONL writer (§4.2): `tmpfile -> fsync -> rename`.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rexlit_common::canonical::canonical_json;
use rexlit_common::error::{Error, Result};

/// Write `records` to `path` as canonical JSONL: observers see either the
/// prior file or the fully-materialized new file, never a partial write.
///
/// Each record must already carry its schema stamp (§4.1) — stamping
/// happens before serialization, not inside this writer.
pub fn write_jsonl_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let dir = path.parent().ok_or_else(|| Error::NotFound(path.display().to_string()))?;
    std::fs::create_dir_all(dir).map_err(Error::Io)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(Error::Io)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        for record in records {
            let line = canonical_json(record)?;
            writer.write_all(line.as_bytes()).map_err(Error::Io)?;
            writer.write_all(b"\n").map_err(Error::Io)?;
        }
        writer.flush().map_err(Error::Io)?;
    }
    tmp.as_file().sync_all().map_err(Error::Io)?;
    tmp.persist(path).map_err(|e| Error::IoWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Write a single serializable value to `path` as pretty JSON through the
/// same `tmpfile -> fsync -> rename` sequence as [`write_jsonl_atomic`], for
/// sidecars that hold one document rather than a line-delimited list.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().ok_or_else(|| Error::NotFound(path.display().to_string()))?;
    std::fs::create_dir_all(dir).map_err(Error::Io)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(Error::Io)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, value).map_err(Error::Json)?;
        writer.flush().map_err(Error::Io)?;
    }
    tmp.as_file().sync_all().map_err(Error::Io)?;
    tmp.persist(path).map_err(|e| Error::IoWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Append a single already-serialized line to `path`, creating it if
/// needed, then `fsync`. Used by the audit ledger (§4.5) where each append
/// must be durable before the sidecar is rewritten.
pub fn append_line_fsync(path: &Path, line: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(Error::Io)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(Error::Io)?;
    writeln!(file, "{line}").map_err(Error::Io)?;
    file.sync_all().map_err(Error::Io)?;
    Ok(())
}

/// Read every non-empty line of a JSONL file as owned strings, in order.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).map_err(Error::Io)?;
    let reader = std::io::BufReader::new(file);
    use std::io::BufRead;
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(Error::Io)?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Rec {
        zeta: u32,
        alpha: u32,
    }

    #[test]
    fn write_jsonl_atomic_produces_canonical_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub/manifest.jsonl");
        let records = vec![Rec { zeta: 1, alpha: 2 }, Rec { zeta: 3, alpha: 4 }];

        write_jsonl_atomic(&path, &records).unwrap();

        let lines = read_lines(&path).unwrap();
        assert_eq!(lines, vec![r#"{"alpha":2,"zeta":1}"#, r#"{"alpha":4,"zeta":3}"#]);
    }

    #[test]
    fn write_jsonl_atomic_never_leaves_partial_file_on_crash_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.jsonl");
        std::fs::write(&path, "previous content\n").unwrap();

        let records = vec![Rec { zeta: 9, alpha: 9 }];
        write_jsonl_atomic(&path, &records).unwrap();

        let lines = read_lines(&path).unwrap();
        assert_eq!(lines, vec![r#"{"alpha":9,"zeta":9}"#]);
    }

    #[test]
    fn append_line_fsync_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        append_line_fsync(&path, "line-one").unwrap();
        append_line_fsync(&path, "line-two").unwrap();

        assert_eq!(read_lines(&path).unwrap(), vec!["line-one", "line-two"]);
    }

    #[test]
    fn read_lines_skips_blank_lines_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.jsonl");
        assert_eq!(read_lines(&missing).unwrap(), Vec::<String>::new());

        let path = dir.path().join("with_blanks.jsonl");
        std::fs::write(&path, "one\n\ntwo\n   \nthree\n").unwrap();
        assert_eq!(read_lines(&path).unwrap(), vec!["one", "two", "three"]);
    }
}
