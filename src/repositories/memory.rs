//! In-memory paste store used by tests and local runs.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::paste::{Paste, Visibility};
use crate::repositories::store::{PasteStore, RecordedView};

#[derive(Default)]
struct Inner {
    pastes: HashMap<Uuid, Paste>,
    views: HashSet<(Uuid, String)>,
}

/// `PasteStore` over process memory.
///
/// The single mutex makes the insert-and-increment step atomic with
/// respect to concurrent callers, mirroring the uniqueness constraint the
/// database implementation leans on.
#[derive(Default)]
pub struct MemoryPasteStore {
    inner: Mutex<Inner>,
}

impl MemoryPasteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AppError::Internal("paste store lock poisoned".to_string()))
    }
}

#[async_trait]
impl PasteStore for MemoryPasteStore {
    async fn insert_paste(&self, paste: &Paste) -> Result<()> {
        let mut inner = self.lock()?;
        inner.pastes.insert(paste.id, paste.clone());
        Ok(())
    }

    async fn find_paste(&self, id: Uuid) -> Result<Option<Paste>> {
        let inner = self.lock()?;
        Ok(inner.pastes.get(&id).cloned())
    }

    async fn record_view(&self, paste_id: Uuid, client_identity: &str) -> Result<RecordedView> {
        let mut inner = self.lock()?;
        let first_view = inner
            .views
            .insert((paste_id, client_identity.to_string()));

        let paste = inner.pastes.get_mut(&paste_id).ok_or(AppError::NotFound)?;
        if first_view {
            paste.view_count += 1;
        }

        Ok(RecordedView {
            first_view,
            view_count: paste.view_count,
        })
    }

    async fn mark_viewed(&self, paste_id: Uuid) -> Result<bool> {
        let mut inner = self.lock()?;
        let paste = inner.pastes.get_mut(&paste_id).ok_or(AppError::NotFound)?;
        let won = !paste.has_been_viewed;
        paste.has_been_viewed = true;
        Ok(won)
    }

    async fn update_visibility(&self, id: Uuid, visibility: Visibility) -> Result<Option<Paste>> {
        let mut inner = self.lock()?;
        Ok(inner.pastes.get_mut(&id).map(|paste| {
            paste.visibility = visibility;
            paste.clone()
        }))
    }

    async fn delete_paste(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.lock()?;
        let removed = inner.pastes.remove(&id).is_some();
        inner.views.retain(|(paste_id, _)| *paste_id != id);
        Ok(removed)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.lock()?;
        let expired: Vec<Uuid> = inner
            .pastes
            .values()
            .filter(|paste| paste.is_expired(now))
            .map(|paste| paste.id)
            .collect();

        for id in &expired {
            inner.pastes.remove(id);
        }
        inner.views.retain(|(paste_id, _)| !expired.contains(paste_id));

        Ok(expired.len() as u64)
    }
}
