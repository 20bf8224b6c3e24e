//! Realtime server configuration

use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Sliding-window cap used by the per-connection `governor` rate limiter
    /// (`spec.md` §6's 60s/90req budget, shared with `quizbattle-api`).
    pub rate_limit_per_minute: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("REALTIME_PORT")
                .unwrap_or_else(|_| "3002".to_string())
                .parse()
                .context("invalid REALTIME_PORT")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            rate_limit_per_minute: env::var("REALTIME_RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "90".to_string())
                .parse()
                .context("invalid REALTIME_RATE_LIMIT_PER_MINUTE")?,
        })
    }
}
