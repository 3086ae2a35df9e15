use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-viewer session state.
///
/// Carries which password-gated pastes this viewer has already verified.
/// Ephemeral: lives in the session store under a TTL and is never written
/// to durable storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerSession {
    pub verified_pastes: HashSet<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ViewerSession {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            verified_pastes: HashSet::new(),
            created_at: now,
        }
    }

    /// Whether this session already verified the password for `paste_id`.
    /// Honored identically by the read and download paths.
    pub fn is_verified(&self, paste_id: Uuid) -> bool {
        self.verified_pastes.contains(&paste_id)
    }

    pub fn mark_verified(&mut self, paste_id: Uuid) {
        self.verified_pastes.insert(paste_id);
    }
}

/// Request extension inserted by the viewer-session middleware.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub session_id: Uuid,
    pub session: ViewerSession,
    /// Heuristic viewer identity for the view ledger, derived from the
    /// forwarded client address.
    pub client_identity: String,
}
