//! Client-side create→share→view flow for zero-knowledge pastes.
//!
//! The envelope is sealed before anything leaves the client: the create
//! request carries ciphertext only, and the key travels exclusively in the
//! locator fragment the creator hands out.

use serde::Serialize;
use uuid::Uuid;

use crate::crypto::envelope::{self, EnvelopeError, EnvelopeKey};
use crate::crypto::transport;
use crate::models::paste::EncryptedEnvelope;

/// The body a client submits to create a zero-knowledge paste.
///
/// Mirrors the create endpoint's contract; there is no plaintext or key
/// field to leak.
#[derive(Debug, Clone, Serialize)]
pub struct ZeroKnowledgeUpload {
    pub zero_knowledge: bool,
    pub encrypted: EncryptedEnvelope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub burn_after_read: bool,
}

/// A sealed upload plus the key that must stay with the creator.
pub struct ShareGrant {
    pub request: ZeroKnowledgeUpload,
    pub key: EnvelopeKey,
}

/// Seals `plaintext` under a fresh key and builds the create request.
pub fn seal_for_upload(
    plaintext: &str,
    password: Option<String>,
    burn_after_read: bool,
) -> Result<ShareGrant, EnvelopeError> {
    let key = EnvelopeKey::generate();
    let encrypted = envelope::seal(plaintext, &key)?;

    Ok(ShareGrant {
        request: ZeroKnowledgeUpload {
            zero_knowledge: true,
            encrypted,
            password,
            burn_after_read,
        },
        key,
    })
}

/// Builds the shareable locator: `<origin>/paste/<id>#<key>`.
pub fn locator_for(origin: &str, paste_id: Uuid, key: &EnvelopeKey) -> String {
    let base = format!("{}/paste/{}", origin.trim_end_matches('/'), paste_id);
    transport::encode_into_locator(&base, &key.export())
}

/// Recovers plaintext on the viewing side: extracts the key from the
/// locator fragment and opens the envelope fetched from the server.
///
/// A locator without a fragment fails with `KeyMissing`, which callers
/// present differently from a `Decryption` failure.
pub fn open_from_locator(
    locator: &str,
    envelope_data: &EncryptedEnvelope,
) -> Result<String, EnvelopeError> {
    let fragment = transport::decode_from_locator(locator).ok_or(EnvelopeError::KeyMissing)?;
    let key = EnvelopeKey::import(fragment)?;
    envelope::open(envelope_data, &key)
}
