use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::repositories::memory::MemoryPasteStore;
use crate::repositories::paste::PgPasteStore;
use crate::repositories::store::PasteStore;
use crate::sessions::{MemorySessionStore, RedisSessionStore, SessionStore};

/// The application's state.
///
/// The paste store and the viewer session store are carried explicitly and
/// injected into every handler; nothing reads connection state from
/// ambient globals.
#[derive(Clone)]
pub struct AppState {
    /// The paste store.
    pub store: Arc<dyn PasteStore>,
    /// The viewer session store.
    pub sessions: Arc<dyn SessionStore>,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Production state: Postgres pastes, Redis sessions.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = crate::db::create_pool(&config.database_url).await?;
        tracing::info!("✅ PostgreSQL pool initialized");

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("✅ Migrations applied");

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = redis::aio::ConnectionManager::new(redis_client).await?;
        tracing::info!("✅ Redis connection manager initialized");

        Ok(AppState {
            store: Arc::new(PgPasteStore::new(pool)),
            sessions: Arc::new(RedisSessionStore::new(redis)),
            config: config.clone(),
        })
    }

    /// Process-local state backed by memory stores; used by tests and
    /// local runs without external services.
    pub fn in_memory(config: Config) -> Self {
        AppState {
            store: Arc::new(MemoryPasteStore::new()),
            sessions: Arc::new(MemorySessionStore::new()),
            config,
        }
    }
}
