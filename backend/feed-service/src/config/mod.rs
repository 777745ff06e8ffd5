/// Configuration management for fork-feed-service
///
/// Loads configuration from environment variables (and `.env` when present).
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity service that issues device tokens
    pub jwt_secret: String,
}

/// Tunables for feed generation and the creation rate limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_seen_window_hours")]
    pub seen_window_hours: i64,
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "default_creates_per_hour")]
    pub creates_per_hour: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl_secs(),
            seen_window_hours: default_seen_window_hours(),
            history_limit: default_history_limit(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            creates_per_hour: default_creates_per_hour(),
        }
    }
}

impl FeedConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn seen_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.seen_window_hours)
    }
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_session_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_seen_window_hours() -> i64 {
    24
}

fn default_history_limit() -> i64 {
    100
}

fn default_lookup_timeout_ms() -> u64 {
    800
}

fn default_fetch_timeout_ms() -> u64 {
    2000
}

fn default_creates_per_hour() -> i64 {
    10
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 8080),
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable not set")?,
            max_connections: env_or("DB_MAX_CONNECTIONS", default_max_connections()),
            min_connections: env_or("DB_MIN_CONNECTIONS", default_min_connections()),
        };

        let redis = RedisConfig {
            url: std::env::var("REDIS_URL").context("REDIS_URL environment variable not set")?,
        };

        let auth = AuthConfig {
            jwt_secret: std::env::var("JWT_SECRET")
                .context("JWT_SECRET environment variable not set")?,
        };

        let feed = FeedConfig {
            session_ttl_secs: env_or("SESSION_TTL_SECS", default_session_ttl_secs()),
            seen_window_hours: env_or("FEED_SEEN_WINDOW_HOURS", default_seen_window_hours()),
            history_limit: env_or("FEED_HISTORY_LIMIT", default_history_limit()),
            lookup_timeout_ms: env_or("FEED_LOOKUP_TIMEOUT_MS", default_lookup_timeout_ms()),
            fetch_timeout_ms: env_or("FEED_FETCH_TIMEOUT_MS", default_fetch_timeout_ms()),
            creates_per_hour: env_or("FORK_CREATES_PER_HOUR", default_creates_per_hour()),
        };

        Ok(Config {
            app,
            database,
            redis,
            auth,
            feed,
        })
    }
}
