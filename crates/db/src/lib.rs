//! Database layer for QuizBattle
//!
//! This crate provides database connection pooling and query functions for the
//! persisted state layout in `spec.md` §6: `users`, `games`, `players`, and
//! `questions`, plus opaque user sessions. The live room state machine owned by
//! `quizbattle-realtime` is the source of truth while a room is active; these
//! tables are written to as a durable record and read back only to reconstruct a
//! room up to its current question boundary (mid-question timing is not
//! persisted, per `spec.md` §9).

pub mod games;
pub mod pool;
pub mod questions;
pub mod ratings;
pub mod room_sync;
pub mod sessions;
pub mod users;

pub use games::{Game, GameDifficulty, GameStatus, Player};
pub use pool::{create_pool, DbPool};
pub use questions::QuestionRow;
pub use ratings::RatingRow;
pub use room_sync::{hydrate_room_state, persist_room_state};
pub use sessions::Session;
pub use users::User;
