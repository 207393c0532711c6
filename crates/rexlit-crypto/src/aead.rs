//! Symmetric authenticated encryption ("Fernet-equivalent" per §4.1):
//! authenticated sealing over the 256-bit key file, implemented with a
//! modern single-pass AEAD cipher rather than reproducing a CBC+HMAC
//! construction bit-for-bit (no byte-compatible wire format is required by
//! any invariant in this system).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};

use rexlit_common::error::{Error, Result};

use crate::key::KeyMaterial;

const NONCE_LEN: usize = 12;

/// Seal `plaintext` under `key`, returning a single base64 token containing
/// a random 96-bit nonce followed by the ciphertext+tag. The key id is not
/// embedded in the token: callers that need to record which key sealed a
/// given artifact do so alongside the ciphertext (e.g. the ledger sidecar),
/// not inside it.
pub fn seal(key: &KeyMaterial, plaintext: &[u8]) -> Result<String> {
    let cipher = ChaCha20Poly1305::new(key.key_bytes().into());
    let mut nonce_bytes = [0u8; NONCE_LEN];
    getrandom::getrandom(&mut nonce_bytes).map_err(|e| Error::DecryptFailed {
        path: format!("<getrandom: {e}>"),
    })?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, Payload::from(plaintext))
        .map_err(|_| Error::DecryptFailed {
            path: "<seal>".to_string(),
        })?;

    let mut token = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    token.extend_from_slice(&nonce_bytes);
    token.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(token))
}

/// Open a token produced by [`seal`]. Any tampering with the nonce,
/// ciphertext, or tag fails authentication and returns `DecryptFailed`.
pub fn open(key: &KeyMaterial, token: &str) -> Result<Vec<u8>> {
    let raw = BASE64.decode(token.as_bytes()).map_err(|_| Error::DecryptFailed {
        path: "<open: invalid base64>".to_string(),
    })?;
    if raw.len() < NONCE_LEN {
        return Err(Error::DecryptFailed {
            path: "<open: truncated token>".to_string(),
        });
    }
    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = ChaCha20Poly1305::new(key.key_bytes().into());
    cipher
        .decrypt(nonce, Payload::from(ciphertext))
        .map_err(|_| Error::DecryptFailed {
            path: "<open>".to_string(),
        })
}
