use std::env;
use anyhow::{Context, Result};

/// The application's configuration.
///
/// There is deliberately no master key here: the server never holds key
/// material for zero-knowledge pastes.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The URL of the Redis server backing viewer sessions.
    pub redis_url: String,
    /// The address the HTTP server binds to.
    pub bind_addr: String,
    /// Lifetime of a viewer session in hours.
    pub session_ttl_hours: i64,
    /// Interval between expired-paste sweeps, in seconds.
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("Invalid SESSION_TTL_HOURS")?,
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("Invalid SWEEP_INTERVAL_SECS")?,
        })
    }

    /// The viewer session lifetime in seconds.
    pub fn session_ttl_secs(&self) -> u64 {
        (self.session_ttl_hours.max(0) as u64) * 3600
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/pastebox".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            session_ttl_hours: 24,
            sweep_interval_secs: 3600,
        }
    }
}
