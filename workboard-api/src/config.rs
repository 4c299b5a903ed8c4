/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma separated allowed origins (default: *)
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `JWT_SECRET`: Secret key for JWT signing (required, at least 32 characters)
/// - `JWT_ACCESS_TTL_MINUTES`: Access token lifetime (default: 60, max: 1440)
/// - `JWT_REFRESH_TTL_DAYS`: Refresh token lifetime (default: 7, max: 365)
/// - `JWT_REFRESHED_ACCESS_TTL_HOURS`: Lifetime of refreshed access tokens (default: 24, max: 720)
///
/// # Example
///
/// ```no_run
/// use workboard_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use chrono::Duration;
use std::env;
use std::str::FromStr;
use workboard_shared::auth::jwt::TokenConfig;
use workboard_shared::db::pool::DatabaseConfig as PoolConfig;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_SECRET_LENGTH: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS on)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub refreshed_access_ttl_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[redacted]")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .field("refreshed_access_ttl_hours", &self.refreshed_access_ttl_hours)
            .finish()
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    /// - `JWT_SECRET` is shorter than 32 characters
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least {MIN_SECRET_LENGTH} characters long");
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            api: ApiConfig {
                host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "API_PORT", 8080)?,
                cors_origins,
                production: parse_or(&lookup, "PRODUCTION", false)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                access_ttl_minutes: parse_bounded(&lookup, "JWT_ACCESS_TTL_MINUTES", 60, 1440)?,
                refresh_ttl_days: parse_bounded(&lookup, "JWT_REFRESH_TTL_DAYS", 7, 365)?,
                refreshed_access_ttl_hours: parse_bounded(
                    &lookup,
                    "JWT_REFRESHED_ACCESS_TTL_HOURS",
                    24,
                    720,
                )?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Pool settings for [`workboard_shared::db::pool::create_pool`]
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }

    /// Signing secret and lifetimes for the session service
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.jwt.secret.clone(),
            access_ttl: Duration::minutes(self.jwt.access_ttl_minutes),
            refresh_ttl: Duration::days(self.jwt.refresh_ttl_days),
            refreshed_access_ttl: Duration::hours(self.jwt.refreshed_access_ttl_hours),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

/// Parses a lifetime in `1..=max` units
fn parse_bounded<F>(lookup: &F, key: &str, default: i64, max: i64) -> anyhow::Result<i64>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default)?;
    if value <= 0 {
        anyhow::bail!("{key} must be positive");
    }
    if value > max {
        anyhow::bail!("{key} must be at most {max}");
    }
    Ok(value)
}
