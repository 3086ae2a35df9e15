use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use aes_gcm::aead::rand_core::RngCore;
use base64::{engine::general_purpose, Engine as _};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::models::paste::EncryptedEnvelope;

/// The size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// The size of the AES-GCM IV in bytes.
pub const IV_SIZE: usize = 12;

/// Client-side envelope failures.
///
/// `Decryption` (wrong key, corrupted ciphertext, IV mismatch) is kept
/// distinct from `KeyMissing` so the viewer can be told which state it is
/// in; both are terminal for the attempt and never retried with the same
/// inputs.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// The authentication tag did not verify.
    #[error("decryption failed: wrong key or corrupted ciphertext")]
    Decryption,

    /// The locator carried no key fragment.
    #[error("no key present in the locator fragment")]
    KeyMissing,

    /// The key material did not decode to a 256-bit key.
    #[error("key material is not a valid 256-bit key")]
    InvalidKey,

    /// An envelope field was not valid base64 of the expected shape.
    #[error("envelope field is not valid base64")]
    Encoding,

    /// The cipher rejected the encryption request.
    #[error("encryption failed")]
    Encryption,
}

/// A 256-bit envelope key, zeroized on drop.
///
/// Exists only within the client boundary; the sole export path is
/// [`EnvelopeKey::export`], whose output rides a URL fragment and is
/// therefore never part of any HTTP request.
#[derive(Zeroize, ZeroizeOnDrop, Debug, PartialEq)]
pub struct EnvelopeKey([u8; KEY_SIZE]);

impl EnvelopeKey {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Raw key material, URL-safe base64 without padding so it can ride in
    /// a URL fragment verbatim.
    pub fn export(&self) -> String {
        general_purpose::URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Reconstructs a key exported by [`EnvelopeKey::export`].
    pub fn import(encoded: &str) -> Result<Self, EnvelopeError> {
        let bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| EnvelopeError::InvalidKey)?;
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| EnvelopeError::InvalidKey)?;
        Ok(Self(key))
    }
}

/// Encrypts `plaintext` under `key` with AES-256-GCM.
///
/// A fresh random 96-bit IV is drawn on every call; re-sealing changed
/// content must come back through here rather than reusing a previous IV.
/// Empty content is sealed like any other.
pub fn seal(plaintext: &str, key: &EnvelopeKey) -> Result<EncryptedEnvelope, EnvelopeError> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);
    let nonce = Nonce::from(iv);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|_| EnvelopeError::Encryption)?;

    Ok(EncryptedEnvelope {
        ciphertext: general_purpose::STANDARD.encode(ciphertext),
        iv: general_purpose::STANDARD.encode(iv),
    })
}

/// Decrypts an envelope.
///
/// Fails with `Decryption` when the authentication tag does not verify;
/// no partial plaintext is ever returned.
pub fn open(envelope: &EncryptedEnvelope, key: &EnvelopeKey) -> Result<String, EnvelopeError> {
    let ciphertext = general_purpose::STANDARD
        .decode(&envelope.ciphertext)
        .map_err(|_| EnvelopeError::Encoding)?;
    let iv_bytes = general_purpose::STANDARD
        .decode(&envelope.iv)
        .map_err(|_| EnvelopeError::Encoding)?;
    let iv: [u8; IV_SIZE] = iv_bytes.try_into().map_err(|_| EnvelopeError::Encoding)?;

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let plaintext = cipher
        .decrypt(&Nonce::from(iv), ciphertext.as_slice())
        .map_err(|_| EnvelopeError::Decryption)?;

    String::from_utf8(plaintext).map_err(|_| EnvelopeError::Decryption)
}
