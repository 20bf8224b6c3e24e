//! API server configuration

use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub frontend_url: String,
    /// Sliding-window cap shared with `quizbattle-realtime`'s per-connection
    /// `governor` limiter (`spec.md` §6's 60 s / 90-requests budget).
    pub rate_limit_per_minute: u32,
    /// Number of trusted reverse proxies in front of this service (e.g. 2 for
    /// Cloudflare + a platform load balancer).
    pub trusted_proxy_count: u8,
    pub trust_cloudflare: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("API_PORT").unwrap_or_else(|_| "3001".to_string()).parse().context("invalid API_PORT")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            rate_limit_per_minute: env::var("API_RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "90".to_string())
                .parse()
                .context("invalid API_RATE_LIMIT_PER_MINUTE")?,
            trusted_proxy_count: env::var("TRUSTED_PROXY_COUNT")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("invalid TRUSTED_PROXY_COUNT")?,
            trust_cloudflare: env::var("TRUST_CLOUDFLARE").map(|v| v == "true").unwrap_or(true),
        })
    }
}
