//! Events emitted by the reducer alongside a new `RoomState`.
//!
//! Events represent things that happened as a result of processing a command: they
//! are what the Connection Hub turns into `answer_result`/`error` socket envelopes.
//! They are distinct from the `Snapshot` the State Projector derives from the state
//! itself — an event is a one-shot notification, a snapshot is the durable picture.

use serde::{Deserialize, Serialize};

use super::reducer::ErrorCategory;
use super::state::Team;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Emitted once per commitment (correct/incorrect answer, skip, or timeout).
    AnswerResult {
        timeout: bool,
        skip: bool,
        correct: bool,
        /// Zero-based, echoing the deck's stored representation (`spec.md` §6).
        correct_option: u8,
        team: Team,
        question_id: String,
    },
    /// A domain error that should close the originating socket with code 1008,
    /// or be returned as the corresponding HTTP status for HTTP-originated commands
    /// (`category` picks which one, `spec.md` §7's taxonomy).
    Error { category: ErrorCategory, code: String, message: String },
}

impl RoomEvent {
    pub fn error(category: ErrorCategory, code: impl Into<String>, message: impl Into<String>) -> Self {
        RoomEvent::Error { category, code: code.into(), message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RoomEvent::Error { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::AnswerResult { .. } => "answer_result",
            RoomEvent::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructor() {
        let event = RoomEvent::error(ErrorCategory::Forbidden, "forbidden", "not your turn");
        assert!(event.is_error());
        assert_eq!(event.name(), "error");
    }

    #[test]
    fn test_answer_result_name() {
        let event = RoomEvent::AnswerResult {
            timeout: false,
            skip: false,
            correct: true,
            correct_option: 1,
            team: Team::A,
            question_id: "qst_1".into(),
        };
        assert_eq!(event.name(), "answer_result");
        assert!(!event.is_error());
    }

    #[test]
    fn test_answer_result_serializes_without_correct_option_leak_beyond_field() {
        let event = RoomEvent::AnswerResult {
            timeout: true,
            skip: false,
            correct: false,
            correct_option: 2,
            team: Team::B,
            question_id: "qst_2".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "answer_result");
        assert_eq!(json["correct_option"], 2);
    }
}
