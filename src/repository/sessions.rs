//! Login sessions storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::user::Session};

#[async_trait]
pub trait SessionsRepository: Send + Sync {
    async fn create(&self, session: &Session) -> AppResult<()>;

    /// Fetch a session by token hash, expired or not
    async fn get(&self, token_hash: &str) -> AppResult<Option<Session>>;

    /// Returns whether a session was removed
    async fn delete(&self, token_hash: &str) -> AppResult<bool>;

    /// Drop every session that expired before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

#[derive(Clone)]
pub struct PgSessionsRepository {
    pool: Pool<Postgres>,
}

impl PgSessionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionsRepository for PgSessionsRepository {
    async fn create(&self, session: &Session) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, remember, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&session.token_hash)
        .bind(session.user_id)
        .bind(session.remember)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, token_hash: &str) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    async fn delete(&self, token_hash: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
