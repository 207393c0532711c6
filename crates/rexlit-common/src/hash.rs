//! SHA-256 content addressing, chunked for files.

use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

const CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 of an in-memory byte slice, as lowercase hex.
pub fn sha256_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// SHA-256 of a file's contents, read in 64 KiB chunks, as lowercase hex.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(Error::Io)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(Error::Io)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Verify that `path`'s current content hashes to `expected`.
pub fn verify_file_hash(path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    if actual != expected {
        return Err(Error::HashMismatch {
            path: path.display().to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sha256_bytes_matches_known_vector() {
        // SHA-256("") = e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
        assert_eq!(
            sha256_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_file_matches_sha256_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"I am a zebra").unwrap();
        drop(f);

        assert_eq!(sha256_file(&path).unwrap(), sha256_bytes(b"I am a zebra"));
    }

    #[test]
    fn sha256_file_chunks_large_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let content = vec![0xABu8; CHUNK_SIZE * 3 + 17];
        std::fs::write(&path, &content).unwrap();

        assert_eq!(sha256_file(&path).unwrap(), sha256_bytes(&content));
    }

    #[test]
    fn verify_file_hash_rejects_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, b"original").unwrap();

        let wrong = sha256_bytes(b"different");
        let err = verify_file_hash(&path, &wrong).unwrap_err();
        assert!(matches!(err, Error::HashMismatch { .. }));
    }
}
