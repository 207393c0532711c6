//! HMAC-SHA256 signing for the audit ledger (§4.5) and its sidecar.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use rexlit_common::error::{Error, Result};

use crate::key::KeyMaterial;

type HmacSha256 = Hmac<Sha256>;

/// `HMAC-SHA256(key, data)`, lowercase hex.
pub fn sign(key: &KeyMaterial, data: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key.key_bytes()).map_err(|_| Error::DecryptFailed {
        path: "<hmac: invalid key length>".to_string(),
    })?;
    mac.update(data);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison against a recomputed signature.
pub fn verify(key: &KeyMaterial, data: &[u8], signature: &str) -> Result<bool> {
    let mut mac = HmacSha256::new_from_slice(key.key_bytes()).map_err(|_| Error::DecryptFailed {
        path: "<hmac: invalid key length>".to_string(),
    })?;
    mac.update(data);
    let expected = hex::decode(signature).map_err(|_| Error::DecryptFailed {
        path: "<hmac: invalid signature hex>".to_string(),
    })?;
    Ok(mac.verify_slice(&expected).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_succeeds() {
        let key = KeyMaterial::generate().unwrap();
        let sig = sign(&key, b"entry_hash_bytes").unwrap();
        assert!(verify(&key, b"entry_hash_bytes", &sig).unwrap());
    }

    #[test]
    fn verify_rejects_tampered_data() {
        let key = KeyMaterial::generate().unwrap();
        let sig = sign(&key, b"original").unwrap();
        assert!(!verify(&key, b"tampered", &sig).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let key = KeyMaterial::generate().unwrap();
        let other = KeyMaterial::generate().unwrap();
        let sig = sign(&key, b"data").unwrap();
        assert!(!verify(&other, b"data", &sig).unwrap());
    }

    #[test]
    fn sign_is_deterministic() {
        let key = KeyMaterial::generate().unwrap();
        assert_eq!(sign(&key, b"data").unwrap(), sign(&key, b"data").unwrap());
    }
}
