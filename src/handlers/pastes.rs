use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    crypto::password,
    error::{AppError, Result},
    models::paste::{AuthenticatedUser, EncryptedEnvelope, NewPaste, Visibility},
    models::session::ViewerContext,
    services::{access, reaper},
    state::AppState,
    validation::pastes as validation,
};

/// Optional caller identity, inserted by an external auth layer when one
/// is installed. An absent extension means an anonymous caller.
pub struct MaybeUser(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthenticatedUser>().copied()))
    }
}

/// The request payload for creating a paste.
#[derive(Deserialize, Debug)]
pub struct CreatePasteRequest {
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub zero_knowledge: bool,
    pub content: Option<String>,
    pub encrypted: Option<EncryptedEnvelope>,
    pub password: Option<String>,
    #[serde(default)]
    pub burn_after_read: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct PasteMetaResponse {
    pub id: Uuid,
    pub visibility: Visibility,
}

/// The response payload for a disclosed paste: `content` XOR `encrypted`.
#[derive(Serialize)]
pub struct PasteResponse {
    pub id: Uuid,
    pub zero_knowledge: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<EncryptedEnvelope>,
    pub view_count: i64,
    pub burn_after_read: bool,
}

impl From<&access::Disclosure> for PasteResponse {
    fn from(disclosure: &access::Disclosure) -> Self {
        let (content, encrypted) = match &disclosure.payload {
            access::PastePayload::Plaintext(text) => (Some(text.clone()), None),
            access::PastePayload::Encrypted(envelope) => (None, Some(envelope.clone())),
        };

        Self {
            id: disclosure.paste_id,
            zero_knowledge: disclosure.zero_knowledge,
            content,
            encrypted,
            view_count: disclosure.view_count,
            burn_after_read: disclosure.burn_after_read,
        }
    }
}

#[derive(Deserialize)]
pub struct VerifyPasswordRequest {
    pub password: String,
}

#[derive(Serialize)]
pub struct VerifyPasswordResponse {
    pub verified: bool,
}

#[derive(Deserialize)]
pub struct UpdatePasteRequest {
    pub visibility: Visibility,
}

/// Creates a paste.
///
/// Zero-knowledge pastes must arrive as ciphertext only: plaintext content
/// is rejected, the envelope shape is validated, and visibility is locked
/// to unlisted. Passwords are hashed before anything is stored.
#[axum::debug_handler]
pub async fn create_paste(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(payload): Json<CreatePasteRequest>,
) -> Result<impl IntoResponse> {
    let owner_id = user.map(|u| u.id);
    let requested = payload.visibility.unwrap_or(Visibility::Public);

    let (visibility, content, encrypted) = if payload.zero_knowledge {
        if payload.content.is_some() {
            return Err(AppError::Validation(
                "Zero-knowledge pastes must not carry plaintext content".to_string(),
            ));
        }
        let envelope = payload.encrypted.ok_or_else(|| {
            AppError::MalformedEnvelope(
                "zero-knowledge paste requires an encrypted envelope".to_string(),
            )
        })?;
        validation::validate_envelope(&envelope)?;

        let visibility = validation::resolve_zero_knowledge_visibility(requested)?;
        (visibility, None, Some(envelope))
    } else {
        if payload.encrypted.is_some() {
            return Err(AppError::Validation(
                "Only zero-knowledge pastes carry an encrypted envelope".to_string(),
            ));
        }
        let content = payload
            .content
            .ok_or_else(|| AppError::Validation("Content is required".to_string()))?;
        validation::validate_content(&content)?;

        (requested, Some(content), None)
    };

    if visibility == Visibility::Private && owner_id.is_none() {
        return Err(AppError::Validation(
            "Private pastes require an authenticated owner".to_string(),
        ));
    }

    let password_hash = match payload.password.as_deref() {
        Some(pw) => {
            validation::validate_password(pw)?;
            Some(password::hash_password(pw)?)
        }
        None => None,
    };

    let paste = NewPaste {
        owner_id,
        visibility,
        zero_knowledge: payload.zero_knowledge,
        content,
        encrypted,
        password_hash,
        burn_after_read: payload.burn_after_read,
        expires_at: payload.expires_at,
    }
    .into_paste(Utc::now());

    state.store.insert_paste(&paste).await?;
    tracing::info!("✅ Paste created: {} ({})", paste.id, paste.visibility.as_str());

    Ok((
        StatusCode::CREATED,
        Json(PasteMetaResponse {
            id: paste.id,
            visibility: paste.visibility,
        }),
    ))
}

/// Reads a paste through the Access Gate.
#[axum::debug_handler]
pub async fn read_paste(
    State(state): State<AppState>,
    Path(paste_id): Path<Uuid>,
    Extension(viewer): Extension<ViewerContext>,
    MaybeUser(user): MaybeUser,
) -> Result<Response> {
    let ctx = access::CallerContext {
        user_id: user.map(|u| u.id),
        client_identity: &viewer.client_identity,
        session: &viewer.session,
    };

    match access::evaluate_read(state.store.as_ref(), &ctx, paste_id, Utc::now()).await? {
        access::ReadOutcome::NotFound => Err(AppError::NotFound),
        access::ReadOutcome::Forbidden => Err(AppError::Forbidden),
        access::ReadOutcome::PasswordRequired => Err(AppError::PasswordRequired),
        access::ReadOutcome::Disclosed(disclosure) => {
            let response = Json(PasteResponse::from(&disclosure)).into_response();

            // Deletion strictly follows response assembly; the reaper task
            // never delays the discloser.
            if disclosure.burn_after_read {
                reaper::schedule_burn(state.store.clone(), disclosure.paste_id);
            }

            Ok(response)
        }
    }
}

/// Downloads a paste as a text attachment. Zero-knowledge pastes are
/// refused by the gate before this handler sees a payload.
#[axum::debug_handler]
pub async fn download_paste(
    State(state): State<AppState>,
    Path(paste_id): Path<Uuid>,
    Extension(viewer): Extension<ViewerContext>,
    MaybeUser(user): MaybeUser,
) -> Result<Response> {
    let ctx = access::CallerContext {
        user_id: user.map(|u| u.id),
        client_identity: &viewer.client_identity,
        session: &viewer.session,
    };

    match access::evaluate_download(state.store.as_ref(), &ctx, paste_id, Utc::now()).await? {
        access::ReadOutcome::NotFound => Err(AppError::NotFound),
        access::ReadOutcome::Forbidden => Err(AppError::Forbidden),
        access::ReadOutcome::PasswordRequired => Err(AppError::PasswordRequired),
        access::ReadOutcome::Disclosed(disclosure) => {
            let text = match disclosure.payload {
                access::PastePayload::Plaintext(ref text) => text.clone(),
                access::PastePayload::Encrypted(_) => {
                    return Err(AppError::Internal(
                        "download disclosed a zero-knowledge payload".to_string(),
                    ));
                }
            };

            let response = (
                StatusCode::OK,
                [
                    (
                        header::CONTENT_TYPE,
                        "text/plain; charset=utf-8".to_string(),
                    ),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}.txt\"", disclosure.paste_id),
                    ),
                ],
                text,
            )
                .into_response();

            if disclosure.burn_after_read {
                reaper::schedule_burn(state.store.clone(), disclosure.paste_id);
            }

            Ok(response)
        }
    }
}

/// Verifies a paste password and marks the viewer session on success.
#[axum::debug_handler]
pub async fn verify_password(
    State(state): State<AppState>,
    Path(paste_id): Path<Uuid>,
    Extension(viewer): Extension<ViewerContext>,
    Json(payload): Json<VerifyPasswordRequest>,
) -> Result<impl IntoResponse> {
    access::verify_password(state.store.as_ref(), paste_id, &payload.password, Utc::now()).await?;

    let mut session = viewer.session.clone();
    session.mark_verified(paste_id);
    state
        .sessions
        .save(viewer.session_id, &session, state.config.session_ttl_secs())
        .await?;

    tracing::debug!(
        "Password verified for paste {} in session {}",
        paste_id,
        viewer.session_id
    );

    Ok(Json(VerifyPasswordResponse { verified: true }))
}

/// Updates a paste's visibility. Owner-only; zero-knowledge pastes are
/// locked to unlisted and the flag itself is immutable.
#[axum::debug_handler]
pub async fn update_paste(
    State(state): State<AppState>,
    Path(paste_id): Path<Uuid>,
    MaybeUser(user): MaybeUser,
    Json(payload): Json<UpdatePasteRequest>,
) -> Result<impl IntoResponse> {
    let user_id = user.map(|u| u.id).ok_or(AppError::Forbidden)?;

    let paste = state
        .store
        .find_paste(paste_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if paste.is_expired(Utc::now()) {
        return Err(AppError::NotFound);
    }
    if paste.owner_id != Some(user_id) {
        return Err(AppError::Forbidden);
    }
    if paste.zero_knowledge && payload.visibility != Visibility::Unlisted {
        return Err(AppError::Validation(
            "Zero-knowledge pastes stay unlisted".to_string(),
        ));
    }

    let updated = state
        .store
        .update_visibility(paste_id, payload.visibility)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(PasteMetaResponse {
        id: updated.id,
        visibility: updated.visibility,
    }))
}

/// Hard-deletes a paste. Owner-only.
#[axum::debug_handler]
pub async fn delete_paste(
    State(state): State<AppState>,
    Path(paste_id): Path<Uuid>,
    MaybeUser(user): MaybeUser,
) -> Result<impl IntoResponse> {
    let user_id = user.map(|u| u.id).ok_or(AppError::Forbidden)?;

    let paste = state
        .store
        .find_paste(paste_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if paste.owner_id != Some(user_id) {
        return Err(AppError::Forbidden);
    }

    state.store.delete_paste(paste_id).await?;
    tracing::info!("Paste deleted by owner: {}", paste_id);

    Ok(StatusCode::NO_CONTENT)
}
