use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::{str::FromStr, time::Duration};
use tracing::info;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str, pool_size: u32) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `:memory:` is its own database, so keep exactly one alive.
        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(pool_size)
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        Ok(Database { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("Migrations completed");
        Ok(())
    }

    /// Fresh migrated in-memory database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let db = Self::new("sqlite::memory:", 1).await?;
        db.run_migrations().await?;
        Ok(db)
    }
}
