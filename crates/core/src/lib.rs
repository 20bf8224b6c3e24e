//! Core domain logic for QuizBattle
//!
//! This crate contains the authoritative room state machine, the reducer that
//! drives it, scoring rules, identifier generation, and session-token generation.
//! It has no knowledge of HTTP, sockets, or the database — those are the job of
//! the `api`, `realtime`, and `db` crates.

pub mod error;
pub mod game;
pub mod id;
pub mod session;

pub use error::CoreError;
pub use id::{generate_game_id, generate_pin, generate_player_id, generate_question_id, generate_session_id, generate_user_id};
