use config::{ConfigError, Environment};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Top-level settings, grouped by the part of the service that reads them
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub catalog: CatalogConfig,
    pub tmdb: TmdbConfig,
    pub payment: PaymentConfig,
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_days: i64,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub movies_path: String,
}

#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub base_url: String,
    pub image_base_url: String,
    pub access_token: String,
    pub request_delay: Duration,
    pub failure_threshold: u32,
    pub retry_after: Duration,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub processing_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    pub session_cleanup_interval: Duration,
}

/// Flat view of the environment. Each field maps to the upper-cased env var
/// of the same name (`db_pool_size` <- `DB_POOL_SIZE`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EnvSettings {
    host: String,
    port: u16,
    environment: String,
    rust_log: String,
    database_url: String,
    db_pool_size: u32,
    jwt_secret: String,
    jwt_expires_in_days: i64,
    movies_path: String,
    tmdb_base_url: String,
    tmdb_image_base_url: String,
    tmdb_access_token: String,
    tmdb_request_delay_ms: u64,
    tmdb_failure_threshold: u32,
    tmdb_retry_after_secs: u64,
    payment_processing_delay_ms: u64,
    session_cleanup_interval_secs: u64,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            environment: "development".to_string(),
            rust_log: "cinemax_api=debug,tower_http=debug".to_string(),
            database_url: "sqlite://cinemax.db".to_string(),
            db_pool_size: 5,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expires_in_days: 7,
            movies_path: "movies.json".to_string(),
            tmdb_base_url: "https://api.themoviedb.org/3".to_string(),
            tmdb_image_base_url: "https://image.tmdb.org/t/p".to_string(),
            tmdb_access_token: String::new(),
            tmdb_request_delay_ms: 250,
            tmdb_failure_threshold: 5,
            tmdb_retry_after_secs: 60,
            payment_processing_delay_ms: 2000,
            session_cleanup_interval_secs: 3600,
        }
    }
}

impl From<EnvSettings> for Config {
    fn from(s: EnvSettings) -> Self {
        Config {
            app: AppConfig {
                host: s.host,
                port: s.port,
                environment: s.environment,
                rust_log: s.rust_log,
            },
            database: DatabaseConfig {
                url: s.database_url,
                pool_size: s.db_pool_size.max(1),
            },
            jwt: JwtConfig {
                secret: s.jwt_secret,
                expires_in_days: s.jwt_expires_in_days,
            },
            catalog: CatalogConfig {
                movies_path: s.movies_path,
            },
            tmdb: TmdbConfig {
                base_url: s.tmdb_base_url.trim_end_matches('/').to_string(),
                image_base_url: s.tmdb_image_base_url.trim_end_matches('/').to_string(),
                access_token: s.tmdb_access_token,
                request_delay: Duration::from_millis(s.tmdb_request_delay_ms),
                failure_threshold: s.tmdb_failure_threshold.max(1),
                retry_after: Duration::from_secs(s.tmdb_retry_after_secs),
            },
            payment: PaymentConfig {
                processing_delay: Duration::from_millis(s.payment_processing_delay_ms),
            },
            maintenance: MaintenanceConfig {
                session_cleanup_interval: Duration::from_secs(s.session_cleanup_interval_secs.max(1)),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        EnvSettings::default().into()
    }
}

impl Config {
    /// Reads settings from the process environment on top of the built-in
    /// defaults. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::default().try_parsing(true))
    }

    fn from_source(env: Environment) -> Result<Self, ConfigError> {
        let defaults = config::Config::try_from(&EnvSettings::default())?;
        let settings: EnvSettings = config::Config::builder()
            .add_source(defaults)
            .add_source(env)
            .build()?
            .try_deserialize()?;
        Ok(settings.into())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}
