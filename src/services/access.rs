//! The Access Gate.
//!
//! A per-request decision function over a paste id: existence, expiration,
//! ownership, password verification, and zero-knowledge gating evaluated
//! in a fixed order, each check a terminal short-circuit unless it passes
//! through. The gate receives everything it needs through an explicit
//! [`CallerContext`] so it can be driven deterministically in tests.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::crypto::password;
use crate::error::{AppError, Result};
use crate::models::paste::{EncryptedEnvelope, Paste, Visibility};
use crate::models::session::ViewerSession;
use crate::repositories::store::PasteStore;

/// Per-request caller state, injected rather than read from globals.
#[derive(Debug, Clone, Copy)]
pub struct CallerContext<'a> {
    /// Resolved by the external auth collaborator, when present.
    pub user_id: Option<Uuid>,
    /// Heuristic viewer identity for the view ledger.
    pub client_identity: &'a str,
    /// The caller's viewer session, holding password verification marks.
    pub session: &'a ViewerSession,
}

/// What a disclosed paste hands back: plaintext XOR the opaque envelope,
/// by construction never both.
#[derive(Debug, Clone, PartialEq)]
pub enum PastePayload {
    Plaintext(String),
    Encrypted(EncryptedEnvelope),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Disclosure {
    pub paste_id: Uuid,
    pub zero_knowledge: bool,
    pub payload: PastePayload,
    pub view_count: i64,
    pub burn_after_read: bool,
}

/// Terminal outcomes of a read attempt.
///
/// Expired and burn-consumed pastes are reported as `NotFound` so neither
/// state leaks existence.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    NotFound,
    Forbidden,
    PasswordRequired,
    Disclosed(Disclosure),
}

/// Evaluates a read request against the gate's fixed check order.
pub async fn evaluate_read(
    store: &dyn PasteStore,
    ctx: &CallerContext<'_>,
    paste_id: Uuid,
    now: DateTime<Utc>,
) -> Result<ReadOutcome> {
    let Some(paste) = store.find_paste(paste_id).await? else {
        return Ok(ReadOutcome::NotFound);
    };

    gate(store, ctx, paste, now).await
}

/// Evaluates a download request.
///
/// Identical gating, except zero-knowledge pastes are refused outright:
/// ciphertext alone is meaningless without the out-of-band key and is not
/// served as a file.
pub async fn evaluate_download(
    store: &dyn PasteStore,
    ctx: &CallerContext<'_>,
    paste_id: Uuid,
    now: DateTime<Utc>,
) -> Result<ReadOutcome> {
    let Some(paste) = store.find_paste(paste_id).await? else {
        return Ok(ReadOutcome::NotFound);
    };

    if paste.zero_knowledge {
        // Still hide expired pastes before admitting anything exists.
        if paste.is_expired(now) {
            return Ok(ReadOutcome::NotFound);
        }
        return Ok(ReadOutcome::Forbidden);
    }

    gate(store, ctx, paste, now).await
}

async fn gate(
    store: &dyn PasteStore,
    ctx: &CallerContext<'_>,
    paste: Paste,
    now: DateTime<Utc>,
) -> Result<ReadOutcome> {
    if paste.is_expired(now) {
        return Ok(ReadOutcome::NotFound);
    }

    if paste.burn_after_read && paste.has_been_viewed {
        // Already consumed; indistinguishable from a missing paste.
        return Ok(ReadOutcome::NotFound);
    }

    let is_owner = match (ctx.user_id, paste.owner_id) {
        (Some(user), Some(owner)) => user == owner,
        _ => false,
    };
    if paste.visibility == Visibility::Private && !is_owner {
        return Ok(ReadOutcome::Forbidden);
    }

    if paste.password_hash.is_some() && !ctx.session.is_verified(paste.id) {
        return Ok(ReadOutcome::PasswordRequired);
    }

    // Disclosure. Burn-after-read pastes are claimed first: the single
    // winner of the `has_been_viewed` flip sees the content, a concurrent
    // loser is told the paste is gone.
    if paste.burn_after_read {
        if !store.mark_viewed(paste.id).await? {
            return Ok(ReadOutcome::NotFound);
        }
    } else {
        store.mark_viewed(paste.id).await?;
    }

    let recorded = store.record_view(paste.id, ctx.client_identity).await?;

    let payload = if paste.zero_knowledge {
        let envelope = paste.encrypted.clone().ok_or_else(|| {
            AppError::Internal("zero-knowledge paste without an envelope".to_string())
        })?;
        PastePayload::Encrypted(envelope)
    } else {
        PastePayload::Plaintext(paste.content.clone().unwrap_or_default())
    };

    Ok(ReadOutcome::Disclosed(Disclosure {
        paste_id: paste.id,
        zero_knowledge: paste.zero_knowledge,
        payload,
        view_count: recorded.view_count,
        burn_after_read: paste.burn_after_read,
    }))
}

/// Verifies a candidate password for a paste.
///
/// Unknown, expired, and burn-consumed ids return `NotFound` so an invalid
/// id is never answered with a password prompt. Pastes without a password
/// return `NotPasswordProtected`. A failed comparison returns
/// `InvalidPassword` and leaves the session untouched; on success the
/// caller records the verification mark in its viewer session.
pub async fn verify_password(
    store: &dyn PasteStore,
    paste_id: Uuid,
    candidate: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let paste = store.find_paste(paste_id).await?.ok_or(AppError::NotFound)?;

    if paste.is_expired(now) || (paste.burn_after_read && paste.has_been_viewed) {
        return Err(AppError::NotFound);
    }

    let hash = paste
        .password_hash
        .as_deref()
        .ok_or(AppError::NotPasswordProtected)?;

    if !password::verify_password(candidate, hash)? {
        return Err(AppError::InvalidPassword);
    }

    Ok(())
}
