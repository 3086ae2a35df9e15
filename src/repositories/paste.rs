use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::paste::{EncryptedEnvelope, Paste, Visibility};
use crate::repositories::store::{PasteStore, RecordedView};

const PASTE_COLUMNS: &str = "id, owner_id, visibility, zero_knowledge, content, ciphertext, iv, \
     password_hash, burn_after_read, has_been_viewed, expires_at, view_count, created_at";

/// Postgres-backed paste store.
#[derive(Clone)]
pub struct PgPasteStore {
    pool: PgPool,
}

impl PgPasteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw row shape; visibility and the envelope are reassembled into domain
/// types after the fetch.
#[derive(sqlx::FromRow)]
struct PasteRow {
    id: Uuid,
    owner_id: Option<Uuid>,
    visibility: String,
    zero_knowledge: bool,
    content: Option<String>,
    ciphertext: Option<String>,
    iv: Option<String>,
    password_hash: Option<String>,
    burn_after_read: bool,
    has_been_viewed: bool,
    expires_at: Option<DateTime<Utc>>,
    view_count: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<PasteRow> for Paste {
    type Error = AppError;

    fn try_from(row: PasteRow) -> Result<Self> {
        let visibility = row
            .visibility
            .parse::<Visibility>()
            .map_err(AppError::Internal)?;

        let encrypted = match (row.ciphertext, row.iv) {
            (Some(ciphertext), Some(iv)) => Some(EncryptedEnvelope { ciphertext, iv }),
            _ => None,
        };

        Ok(Paste {
            id: row.id,
            owner_id: row.owner_id,
            visibility,
            zero_knowledge: row.zero_knowledge,
            content: row.content,
            encrypted,
            password_hash: row.password_hash,
            burn_after_read: row.burn_after_read,
            has_been_viewed: row.has_been_viewed,
            expires_at: row.expires_at,
            view_count: row.view_count,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl PasteStore for PgPasteStore {
    async fn insert_paste(&self, paste: &Paste) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pastes (
                id, owner_id, visibility, zero_knowledge, content, ciphertext, iv,
                password_hash, burn_after_read, has_been_viewed, expires_at,
                view_count, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(paste.id)
        .bind(paste.owner_id)
        .bind(paste.visibility.as_str())
        .bind(paste.zero_knowledge)
        .bind(&paste.content)
        .bind(paste.encrypted.as_ref().map(|e| e.ciphertext.as_str()))
        .bind(paste.encrypted.as_ref().map(|e| e.iv.as_str()))
        .bind(&paste.password_hash)
        .bind(paste.burn_after_read)
        .bind(paste.has_been_viewed)
        .bind(paste.expires_at)
        .bind(paste.view_count)
        .bind(paste.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_paste(&self, id: Uuid) -> Result<Option<Paste>> {
        let sql = format!("SELECT {PASTE_COLUMNS} FROM pastes WHERE id = $1");
        let row = sqlx::query_as::<_, PasteRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Paste::try_from).transpose()
    }

    async fn record_view(&self, paste_id: Uuid, client_identity: &str) -> Result<RecordedView> {
        let mut tx = self.pool.begin().await?;

        // The composite primary key is the sole source of truth for
        // "first view"; the counter update is conditional on the insert
        // actually having added a row.
        let inserted = sqlx::query(
            r#"
            INSERT INTO paste_views (paste_id, client_identity)
            VALUES ($1, $2)
            ON CONFLICT (paste_id, client_identity) DO NOTHING
            "#,
        )
        .bind(paste_id)
        .bind(client_identity)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        let view_count: i64 = if inserted {
            sqlx::query_scalar(
                "UPDATE pastes SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
            )
            .bind(paste_id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query_scalar("SELECT view_count FROM pastes WHERE id = $1")
                .bind(paste_id)
                .fetch_one(&mut *tx)
                .await?
        };

        tx.commit().await?;

        Ok(RecordedView {
            first_view: inserted,
            view_count,
        })
    }

    async fn mark_viewed(&self, paste_id: Uuid) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE pastes SET has_been_viewed = TRUE WHERE id = $1 AND NOT has_been_viewed",
        )
        .bind(paste_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn update_visibility(&self, id: Uuid, visibility: Visibility) -> Result<Option<Paste>> {
        let sql = format!(
            "UPDATE pastes SET visibility = $2 WHERE id = $1 RETURNING {PASTE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PasteRow>(&sql)
            .bind(id)
            .bind(visibility.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Paste::try_from).transpose()
    }

    async fn delete_paste(&self, id: Uuid) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM pastes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted == 1)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let removed = sqlx::query(
            "DELETE FROM pastes WHERE expires_at IS NOT NULL AND expires_at < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(removed)
    }
}
