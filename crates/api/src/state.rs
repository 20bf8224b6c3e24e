//! Application state: wraps `quizbattle-realtime`'s `AppState` (database pool,
//! room registry, connection hub, question oracle) so the HTTP routes reach
//! the same room actors a WebSocket connection does, plus the HTTP-only
//! concerns (Redis rate limiting, session cookies) `quizbattle-realtime` has
//! no need of.

use anyhow::Result;
use quizbattle_auth::middleware::AuthState;
use quizbattle_auth::session::SessionConfig;
use quizbattle_db::DbPool;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session_config: SessionConfig,
    pub redis: redis::Client,
    pub realtime: quizbattle_realtime::AppState,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self> {
        let realtime_config = quizbattle_realtime::Config {
            port: config.port,
            database_url: config.database_url.clone(),
            rate_limit_per_minute: config.rate_limit_per_minute,
        };
        let realtime = quizbattle_realtime::AppState::new(realtime_config).await?;

        sqlx::migrate!("../../migrations").run(&realtime.db).await?;
        tracing::info!("Database migrations completed");

        let redis = redis::Client::open(config.redis_url.clone())?;
        let session_config =
            if crate::logging::is_production() { SessionConfig::default() } else { SessionConfig::development() };

        Ok(Self { config: config.clone(), session_config, redis, realtime })
    }

    pub fn db(&self) -> &DbPool {
        &self.realtime.db
    }
}

impl AuthState for AppState {
    fn db_pool(&self) -> &sqlx::PgPool {
        &self.realtime.db
    }

    fn session_config(&self) -> &SessionConfig {
        &self.session_config
    }
}
