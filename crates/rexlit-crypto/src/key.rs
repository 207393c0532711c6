//! 256-bit key material and its on-disk lifecycle (§4.1).
//!
//! Key files are created on first use, written via
//! `open(O_WRONLY|O_CREAT|O_TRUNC, 0600)` then `fsync`, and best-effort
//! `chmod 0600`. The same lifecycle serves both AEAD sealing keys and HMAC
//! signing keys.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use rexlit_common::error::{Error, Result};

pub const KEY_LEN: usize = 32;

/// A single 256-bit key plus the identifier used to tag artifacts sealed or
/// signed with it (e.g. in the audit ledger's HMAC or a plan's AEAD
/// ciphertext header).
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyMaterial {
    key_id: String,
    #[serde(with = "base64_bytes")]
    key: [u8; KEY_LEN],
}

mod base64_bytes {
    use super::{BASE64, KEY_LEN};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &[u8; KEY_LEN], s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&BASE64.encode(key))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<[u8; KEY_LEN], D::Error> {
        use serde::de::Error as _;
        use base64::Engine as _;
        let s = String::deserialize(d)?;
        let bytes = BASE64.decode(s.as_bytes()).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("key material must be 32 bytes"))
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_id", &self.key_id)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl KeyMaterial {
    /// Generate fresh random key material with a random key id.
    pub fn generate() -> Result<Self> {
        let mut key = [0u8; KEY_LEN];
        getrandom::getrandom(&mut key).map_err(|e| Error::DecryptFailed {
            path: format!("<getrandom: {e}>"),
        })?;
        let mut id_bytes = [0u8; 8];
        getrandom::getrandom(&mut id_bytes).map_err(|e| Error::DecryptFailed {
            path: format!("<getrandom: {e}>"),
        })?;
        Ok(KeyMaterial {
            key_id: hex::encode(id_bytes),
            key,
        })
    }

    pub fn from_bytes(key_id: impl Into<String>, key: [u8; KEY_LEN]) -> Self {
        KeyMaterial {
            key_id: key_id.into(),
            key,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn key_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Load key material from `path` if it exists, otherwise generate and
    /// persist fresh material (§4.1 create-on-first-use).
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path).map_err(Error::Io)?;
            serde_json::from_str(&data).map_err(Error::Json)
        } else {
            let material = Self::generate()?;
            material.save(path)?;
            Ok(material)
        }
    }

    /// Write key material to `path` with `0600` permissions, fsynced.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self).map_err(Error::Json)?;
        write_secure_file(path, json.as_bytes())
    }
}

/// `open(O_WRONLY|O_CREAT|O_TRUNC, 0600)` + write + `fsync`, then a
/// best-effort `chmod 0600` for filesystems where the initial mode didn't
/// stick (e.g. a restrictive umask override).
#[cfg(unix)]
pub fn write_secure_file(path: &Path, data: &[u8]) -> Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(Error::Io)?;
    file.write_all(data).map_err(Error::Io)?;
    file.sync_all().map_err(Error::Io)?;

    // Best-effort: some filesystems / existing files ignore the mode passed
    // to open(); make sure 0600 holds regardless.
    let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));

    Ok(())
}

#[cfg(not(unix))]
pub fn write_secure_file(path: &Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).map_err(Error::Io)
}
