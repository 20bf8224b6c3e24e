//! Application state: the Room Registry (`spec.md` §5's shared, read-heavy
//! resource) plus the dependencies a room actor needs to run.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use quizbattle_db::DbPool;
use quizbattle_oracle::QuestionProvider;
use tokio::sync::{mpsc, RwLock};

use crate::actors::{self, Envelope};
use crate::config::Config;
use crate::hub::Hub;

#[derive(Clone)]
pub struct RoomHandle {
    pub tx: mpsc::Sender<Envelope>,
}

/// Map of PIN to the actor currently owning that room. Read on every socket
/// connect, written only when a room's first connection spawns its actor or
/// when the actor exits.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, RoomHandle>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, pin: &str) -> Option<RoomHandle> {
        self.rooms.read().await.get(pin).cloned()
    }

    pub async fn insert(&self, pin: String, handle: RoomHandle) {
        self.rooms.write().await.insert(pin, handle);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub rooms: Arc<RoomRegistry>,
    pub hub: Arc<Hub>,
    pub oracle: Arc<dyn QuestionProvider>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let db = quizbattle_db::create_pool(&config.database_url).await?;
        let oracle = build_oracle();
        Ok(Self { db, config, rooms: Arc::new(RoomRegistry::new()), hub: Arc::new(Hub::new()), oracle })
    }

    /// Return the room's actor handle, spawning it by hydrating from the
    /// database if this is the first connection since process start.
    pub async fn get_or_spawn_room(&self, pin: &str) -> Result<Option<RoomHandle>> {
        if let Some(handle) = self.rooms.get(pin).await {
            return Ok(Some(handle));
        }

        let Some(game) = quizbattle_db::games::get_live_by_pin(&self.db, pin).await? else {
            return Ok(None);
        };

        let state = quizbattle_db::hydrate_room_state(&self.db, &game).await?;
        let tx = actors::spawn(self.db.clone(), self.hub.clone(), self.oracle.clone(), game.id.clone(), game.pin.clone(), state);
        let handle = RoomHandle { tx };
        self.rooms.insert(pin.to_string(), handle.clone()).await;
        Ok(Some(handle))
    }

    /// Spawn a freshly created room's actor directly from an in-memory
    /// `RoomState`, bypassing hydration since no durable row has been read
    /// back yet (the caller, `quizbattle-api`'s `POST /games`, already holds
    /// the state it just built and persisted).
    pub async fn spawn_new_room(&self, game_id: String, pin: String, state: quizbattle_core::game::RoomState) -> RoomHandle {
        let tx = actors::spawn(self.db.clone(), self.hub.clone(), self.oracle.clone(), game_id, pin.clone(), state);
        let handle = RoomHandle { tx };
        self.rooms.insert(pin, handle.clone()).await;
        handle
    }
}

fn build_oracle() -> Arc<dyn QuestionProvider> {
    let api_key = std::env::var("ORACLE_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        return Arc::new(quizbattle_oracle::FallbackQuestionProvider);
    }
    let api_base = std::env::var("ORACLE_API_BASE").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
    let model = std::env::var("ORACLE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
    Arc::new(quizbattle_oracle::HttpQuestionProvider::new(api_base, api_key, model))
}
