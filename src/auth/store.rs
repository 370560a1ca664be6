use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Server-side record of the single currently-valid credential per user.
/// A credential whose signature still verifies but that has no matching row
/// here is treated as revoked.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuthToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Exact match on both user id and token string. Matching on the pair
    /// keeps a stolen token string from being accepted for another user.
    async fn find_active(&self, user_id: Uuid, token: &str) -> anyhow::Result<Option<AuthToken>>;
    async fn create(&self, user_id: Uuid, token: &str) -> anyhow::Result<AuthToken>;
    /// Deletes every token row for the user; returns the number removed.
    /// Callers must await this before creating a replacement token.
    async fn invalidate_all(&self, user_id: Uuid) -> anyhow::Result<u64>;
}

pub struct PgTokenStore {
    db: PgPool,
}

impl PgTokenStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn find_active(&self, user_id: Uuid, token: &str) -> anyhow::Result<Option<AuthToken>> {
        let row = sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT id, user_id, token, created_at
            FROM auth_tokens
            WHERE user_id = $1 AND token = $2
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create(&self, user_id: Uuid, token: &str) -> anyhow::Result<AuthToken> {
        let row = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (user_id, token)
            VALUES ($1, $2)
            RETURNING id, user_id, token, created_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn invalidate_all(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
