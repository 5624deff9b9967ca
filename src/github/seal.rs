//! Anonymous sealed-box encryption for Actions secrets
//!
//! Compatible with libsodium's `crypto_box_seal`: an ephemeral X25519 key
//! pair is generated per message, so only the holder of the recipient's
//! private key can open it.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use crypto_box::{PublicKey, aead::OsRng};

use crate::{Error, Result};

/// Seal `plaintext` against a base64-encoded X25519 public key
///
/// Returns the ciphertext as standard (padded) base64, the encoding the
/// GitHub secrets API expects for `encrypted_value`.
pub fn seal(public_key_b64: &str, plaintext: &[u8]) -> Result<String> {
    let key_bytes = STANDARD
        .decode(public_key_b64.trim())
        .map_err(|e| Error::Encryption(format!("public key is not valid base64: {e}")))?;

    let key: [u8; crypto_box::KEY_SIZE] = key_bytes.as_slice().try_into().map_err(|_| {
        Error::Encryption(format!(
            "public key must be {} bytes, got {}",
            crypto_box::KEY_SIZE,
            key_bytes.len()
        ))
    })?;

    let sealed = PublicKey::from(key)
        .seal(&mut OsRng, plaintext)
        .map_err(|e| Error::Encryption(format!("sealing failed: {e}")))?;

    Ok(STANDARD.encode(sealed))
}
