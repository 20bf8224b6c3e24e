//! Realtime engine: the Room Registry, per-room actor, Connection Hub, and
//! WebSocket upgrade handler that `quizbattle-api` mounts alongside its HTTP
//! control surface onto one shared `AppState`.

pub mod actors;
pub mod config;
pub mod handlers;
pub mod hub;
pub mod rate_limit;
pub mod state;

pub use config::Config;
pub use state::AppState;
