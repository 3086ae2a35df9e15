//! Store trait: the abstract interface for paste persistence.
//!
//! Keeps the Access Gate storage-agnostic. Implementations include
//! Postgres (primary) and in-memory (for tests and local runs).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::paste::{Paste, Visibility};

/// Outcome of recording a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedView {
    /// Whether this `(paste, identity)` pair was seen for the first time.
    pub first_view: bool,
    /// The authoritative distinct-viewer count after the call.
    pub view_count: i64,
}

#[async_trait]
pub trait PasteStore: Send + Sync {
    /// Persist a new paste.
    async fn insert_paste(&self, paste: &Paste) -> Result<()>;

    /// Fetch a paste by id. Expiration is not applied here; the gate
    /// decides how expired records are rendered.
    async fn find_paste(&self, id: Uuid) -> Result<Option<Paste>>;

    /// Record one view for `(paste_id, client_identity)`.
    ///
    /// Insert-or-ignore on the composite key: only an insert that actually
    /// added a row increments `view_count`. Concurrent duplicate attempts
    /// must resolve to exactly one increment — the uniqueness constraint,
    /// not a prior read of the counter, decides "first time". A losing
    /// duplicate insert is a success ("already viewed"), never an error.
    async fn record_view(&self, paste_id: Uuid, client_identity: &str) -> Result<RecordedView>;

    /// Atomically flip `has_been_viewed`, returning whether this call won
    /// the flip. For burn-after-read pastes the winner is the single
    /// caller allowed to disclose content.
    async fn mark_viewed(&self, paste_id: Uuid) -> Result<bool>;

    /// Update visibility, returning the updated paste, or `None` when the
    /// id does not resolve.
    async fn update_visibility(&self, id: Uuid, visibility: Visibility) -> Result<Option<Paste>>;

    /// Hard-delete a paste and its view records. Returns whether a row
    /// was removed.
    async fn delete_paste(&self, id: Uuid) -> Result<bool>;

    /// Delete every paste whose `expires_at` lies before `now`; returns
    /// the number of pastes removed.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
