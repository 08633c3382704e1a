use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

pub const BASE_PRICE_KEY: &str = "base_price";
pub const DEFAULT_BASE_PRICE: f64 = 250.0;

#[derive(Debug, Clone, FromRow)]
pub struct PricingEntry {
    pub id: i64,
    pub config_key: String,
    pub config_value: f64,
    pub description: Option<String>,
}

/// One entry of the admin pricing map, keyed by `config_key`.
#[derive(Debug, Clone, Serialize)]
pub struct PricingValue {
    pub value: f64,
    pub description: Option<String>,
    pub id: i64,
}

impl PricingEntry {
    pub async fn list(pool: &SqlitePool) -> Result<Vec<PricingEntry>, sqlx::Error> {
        sqlx::query_as::<_, PricingEntry>(
            "SELECT id, config_key, config_value, description FROM pricing_config ORDER BY config_key",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn value(pool: &SqlitePool, key: &str) -> Result<Option<f64>, sqlx::Error> {
        sqlx::query_scalar::<_, f64>("SELECT config_value FROM pricing_config WHERE config_key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Returns false when the key does not exist.
    pub async fn set(pool: &SqlitePool, key: &str, value: f64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pricing_config SET config_value = ?, updated_at = ? WHERE config_key = ?",
        )
        .bind(value)
        .bind(chrono::Utc::now())
        .bind(key)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
