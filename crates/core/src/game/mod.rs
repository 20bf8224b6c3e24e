//! Room state machine: rules, state, commands, events, scoring, and the reducer.

pub mod commands;
pub mod deck;
pub mod events;
pub mod reducer;
pub mod rules;
pub mod scoring;
pub mod state;

pub use commands::{HostAction, RoomCommand};
pub use events::RoomEvent;
pub use reducer::{advance_countdown, begin_first_question, reduce, ErrorCategory, ReducerResult, RoomError};
pub use rules::{Difficulty, RoomConfig};
pub use state::{project, PlayerState, QuestionState, RoomPhase, RoomState, RoomStatus, Snapshot, Team};
