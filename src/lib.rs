pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;

use axum::Router;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use error::AppResult;
use services::{auth::TokenService, catalog::MovieCatalog, tmdb::TmdbClient};

// Shared state for every handler
pub struct AppState {
    pub db: database::Database,
    pub config: config::Config,
    pub tokens: TokenService,
    pub catalog: MovieCatalog,
    pub tmdb: TmdbClient,
}

impl AppState {
    /// Connects and migrates the configured database, then loads the catalog.
    pub async fn new(config: config::Config) -> AppResult<Arc<Self>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;
        db.run_migrations().await.map_err(sqlx::Error::from)?;
        Self::with_database(config, db).await
    }

    /// Builds the state around an already migrated database.
    pub async fn with_database(config: config::Config, db: database::Database) -> AppResult<Arc<Self>> {
        let catalog = MovieCatalog::load(&config.catalog.movies_path).await?;
        let tmdb = TmdbClient::new(&config.tmdb)?;
        let tokens = TokenService::new(&config.jwt);
        Ok(Arc::new(Self { db, config, tokens, catalog, tmdb }))
    }
}

/// The full HTTP application: every route under `/api`, CORS and request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", controllers::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
