//! Ledger sidecar metadata (§6): `{last_hash, last_sequence, hmac}`, the
//! authoritative source of truth for the ledger's tip (§9 Design Notes).

use serde::{Deserialize, Serialize};

use rexlit_common::error::{Error, Result};
use rexlit_crypto::{hmac_sign, KeyMaterial};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSidecar {
    pub last_hash: String,
    pub last_sequence: u64,
    pub hmac: String,
}

impl LedgerSidecar {
    /// Build a sidecar sealing `last_hash|last_sequence` with `key`.
    pub fn seal(last_hash: String, last_sequence: u64, key: &KeyMaterial) -> Result<Self> {
        let payload = format!("{last_hash}|{last_sequence}");
        let hmac = hmac_sign::sign(key, payload.as_bytes())?;
        Ok(LedgerSidecar {
            last_hash,
            last_sequence,
            hmac,
        })
    }

    /// Verify the sidecar's own HMAC seal against `key`.
    pub fn verify_seal(&self, key: &KeyMaterial) -> Result<bool> {
        let payload = format!("{}|{}", self.last_hash, self.last_sequence);
        hmac_sign::verify(key, payload.as_bytes(), &self.hmac)
    }

    pub fn load(path: &std::path::Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(path).map_err(Error::Io)?;
        serde_json::from_str(&data).map(Some).map_err(Error::Json)
    }

    /// Atomically rewrite the sidecar file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let json = serde_json::to_string(self).map_err(Error::Json)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(Error::Io)?;
        }
        let mut tmp = tempfile::NamedTempFile::new_in(
            path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        )
        .map_err(Error::Io)?;
        use std::io::Write;
        tmp.write_all(json.as_bytes()).map_err(Error::Io)?;
        tmp.as_file().sync_all().map_err(Error::Io)?;
        tmp.persist(path).map_err(|e| Error::IoWriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
