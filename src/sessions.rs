//! Viewer session persistence.
//!
//! Sessions carry only which password-gated pastes a viewer has verified.
//! The Redis implementation keeps them as JSON under `viewer_session:{id}`
//! with a TTL, so nothing survives the session lifetime.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::session::ViewerSession;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: Uuid) -> Result<Option<ViewerSession>>;
    async fn save(&self, session_id: Uuid, session: &ViewerSession, ttl_secs: u64) -> Result<()>;
    async fn delete(&self, session_id: Uuid) -> Result<()>;
}

/// Redis-backed viewer sessions.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn key(session_id: Uuid) -> String {
        format!("viewer_session:{}", session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: Uuid) -> Result<Option<ViewerSession>> {
        let mut redis = self.redis.clone();
        let raw: Option<String> = redis.get(Self::key(session_id)).await?;

        match raw {
            Some(json) => {
                let session = sonic_rs::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Session deserialization failed: {}", e))
                })?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session_id: Uuid, session: &ViewerSession, ttl_secs: u64) -> Result<()> {
        let json = sonic_rs::to_string(session)
            .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

        let mut redis = self.redis.clone();
        let _: () = redis.set_ex(Self::key(session_id), json, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, session_id: Uuid) -> Result<()> {
        let mut redis = self.redis.clone();
        let _: () = redis.del(Self::key(session_id)).await?;
        Ok(())
    }
}

/// In-memory viewer sessions for tests and local runs. TTLs are not
/// enforced; the process lifetime bounds these sessions instead.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<HashMap<Uuid, ViewerSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: Uuid) -> Result<Option<ViewerSession>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| AppError::Internal("session store lock poisoned".to_string()))?;
        Ok(inner.get(&session_id).cloned())
    }

    async fn save(&self, session_id: Uuid, session: &ViewerSession, _ttl_secs: u64) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AppError::Internal("session store lock poisoned".to_string()))?;
        inner.insert(session_id, session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: Uuid) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AppError::Internal("session store lock poisoned".to_string()))?;
        inner.remove(&session_id);
        Ok(())
    }
}
