//! Optional raw chain-of-thought vault (§4.11). Disabled by default; when a
//! caller explicitly opts in, the raw CoT is written to `{hash}.enc` under
//! AEAD when a vault key is present, deduped by content hash so the same
//! reasoning is never written twice.

use std::path::{Path, PathBuf};

use rexlit_common::error::{Error, Result};
use rexlit_common::hash::sha256_bytes;
use rexlit_crypto::aead;
use rexlit_crypto::key::KeyMaterial;

pub struct ReasoningVault {
    dir: PathBuf,
    key: Option<KeyMaterial>,
}

impl ReasoningVault {
    pub fn new(dir: impl Into<PathBuf>, key: Option<KeyMaterial>) -> Self {
        ReasoningVault { dir: dir.into(), key }
    }

    /// Persist `raw_cot` keyed by its content hash. Returns the hash used
    /// as the file stem. A no-op if the file already exists (dedup).
    pub fn store(&self, raw_cot: &str) -> Result<String> {
        std::fs::create_dir_all(&self.dir).map_err(Error::Io)?;
        let hash = sha256_bytes(raw_cot.as_bytes());
        let path = self.path_for(&hash);
        if path.exists() {
            return Ok(hash);
        }

        let payload = match &self.key {
            Some(key) => aead::seal(key, raw_cot.as_bytes())?,
            None => raw_cot.to_string(),
        };
        std::fs::write(&path, payload).map_err(Error::Io)?;
        Ok(hash)
    }

    pub fn retrieve(&self, hash: &str) -> Result<String> {
        let path = self.path_for(hash);
        let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
        match &self.key {
            Some(key) => {
                let bytes = aead::open(key, &raw)?;
                String::from_utf8(bytes).map_err(|_| Error::DecryptFailed {
                    path: path.display().to_string(),
                })
            }
            None => Ok(raw),
        }
    }

    fn path_for(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{hash}.enc"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
