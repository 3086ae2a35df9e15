use base64::{engine::general_purpose, Engine as _};

use crate::crypto::envelope::IV_SIZE;
use crate::error::{AppError, Result};
use crate::models::paste::{EncryptedEnvelope, Visibility};

/// Upper bound on paste content, plaintext or encoded ciphertext.
pub const MAX_CONTENT_BYTES: usize = 512 * 1024;
/// Upper bound on paste passwords.
pub const MAX_PASSWORD_LEN: usize = 128;
/// AES-GCM authentication tag length; no valid ciphertext is shorter.
const TAG_SIZE: usize = 16;

/// Validates plaintext content for a non-zero-knowledge paste.
pub fn validate_content(content: &str) -> Result<()> {
    if content.len() > MAX_CONTENT_BYTES {
        return Err(AppError::Validation(format!(
            "Content must be at most {} bytes",
            MAX_CONTENT_BYTES
        )));
    }

    Ok(())
}

/// Validates a paste password before it is hashed.
pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(AppError::Validation("Password cannot be empty".to_string()));
    }

    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }

    Ok(())
}

/// Checks the shape of a zero-knowledge envelope at the creation boundary:
/// both fields valid base64, a 96-bit IV, and a ciphertext at least one
/// authentication tag long.
pub fn validate_envelope(envelope: &EncryptedEnvelope) -> Result<()> {
    if envelope.ciphertext.len() > MAX_CONTENT_BYTES {
        return Err(AppError::Validation(format!(
            "Ciphertext must be at most {} bytes",
            MAX_CONTENT_BYTES
        )));
    }

    let ciphertext = general_purpose::STANDARD
        .decode(&envelope.ciphertext)
        .map_err(|_| AppError::MalformedEnvelope("ciphertext is not valid base64".to_string()))?;

    let iv = general_purpose::STANDARD
        .decode(&envelope.iv)
        .map_err(|_| AppError::MalformedEnvelope("iv is not valid base64".to_string()))?;

    if iv.len() != IV_SIZE {
        return Err(AppError::MalformedEnvelope(format!(
            "iv must decode to {} bytes",
            IV_SIZE
        )));
    }

    if ciphertext.len() < TAG_SIZE {
        return Err(AppError::MalformedEnvelope(
            "ciphertext is shorter than an authentication tag".to_string(),
        ));
    }

    Ok(())
}

/// Resolves the requested visibility under the zero-knowledge lock:
/// `private` is rejected, anything else is forced to `unlisted`.
pub fn resolve_zero_knowledge_visibility(requested: Visibility) -> Result<Visibility> {
    if requested == Visibility::Private {
        return Err(AppError::Validation(
            "Zero-knowledge pastes cannot be private".to_string(),
        ));
    }

    Ok(Visibility::Unlisted)
}
