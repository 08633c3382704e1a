use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Revoked tokens. Rows are keyed by the token's SHA-256 and live until `expires_at`.
pub struct RevokedToken;

impl RevokedToken {
    pub async fn insert(
        pool: &SqlitePool,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO sessions (user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(token_hash)
            .bind(expires_at)
            .bind(Utc::now())
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn is_revoked(pool: &SqlitePool, token_hash: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sessions WHERE token_hash = ? AND expires_at > ?)",
        )
        .bind(token_hash)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Deletes rows that no longer block anything. Returns how many were removed.
    pub async fn purge_expired(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
