//! Commands accepted by the room reducer.

use serde::{Deserialize, Serialize};

use super::rules::Difficulty;
use super::state::QuestionState;

/// A host-only control action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "control_action", rename_all = "snake_case")]
pub enum HostAction {
    Pause,
    Resume,
    NextQuestion,
    Kick { target_player_id: String },
    /// A freshly-fetched deck is supplied by the caller since building it requires
    /// an async call to the question oracle, which the reducer itself never performs.
    Restart { topic: Option<String>, difficulty: Option<Difficulty>, deck: Vec<QuestionState> },
}

/// A command addressed to a single room's actor.
#[derive(Debug, Clone)]
pub enum RoomCommand {
    Join { player_id: String, user_id: Option<String>, name: String },
    Start { player_id: String },
    /// `option_index` is 1-based on the wire (`spec.md` §6); converted to 0-based
    /// internally before comparison against `correct_option`.
    Answer { player_id: String, option_index: u8 },
    Vote { player_id: String, choice: String },
    Skip { player_id: String },
    TransferCaptain { player_id: String, to_player_id: String },
    HostControl { player_id: String, action: HostAction },
    Disconnect { player_id: String },
    /// Synthetic command re-injected by the Deadline Timer for the question it was
    /// armed against. A no-op if that question is no longer current/unanswered.
    Timeout { question_id: String },
}

impl RoomCommand {
    /// Commands that must be issued by the room's host.
    pub fn requires_host(&self) -> bool {
        matches!(self, RoomCommand::Start { .. } | RoomCommand::HostControl { .. })
    }

    /// Stable name used in logs and in rejected-command socket closes.
    pub fn name(&self) -> &'static str {
        match self {
            RoomCommand::Join { .. } => "join",
            RoomCommand::Start { .. } => "start",
            RoomCommand::Answer { .. } => "answer",
            RoomCommand::Vote { .. } => "vote",
            RoomCommand::Skip { .. } => "skip",
            RoomCommand::TransferCaptain { .. } => "transfer_captain",
            RoomCommand::HostControl { .. } => "host_control",
            RoomCommand::Disconnect { .. } => "disconnect",
            RoomCommand::Timeout { .. } => "timeout",
        }
    }

    /// The player id this command originates from, if any (the timer has none).
    pub fn player_id(&self) -> Option<&str> {
        match self {
            RoomCommand::Join { player_id, .. }
            | RoomCommand::Start { player_id }
            | RoomCommand::Answer { player_id, .. }
            | RoomCommand::Vote { player_id, .. }
            | RoomCommand::Skip { player_id }
            | RoomCommand::TransferCaptain { player_id, .. }
            | RoomCommand::HostControl { player_id, .. }
            | RoomCommand::Disconnect { player_id } => Some(player_id),
            RoomCommand::Timeout { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_host() {
        assert!(RoomCommand::Start { player_id: "plr_1".into() }.requires_host());
        assert!(
            RoomCommand::HostControl { player_id: "plr_1".into(), action: HostAction::Pause }
                .requires_host()
        );
        assert!(!RoomCommand::Vote { player_id: "plr_1".into(), choice: "a".into() }.requires_host());
    }

    #[test]
    fn test_command_names() {
        assert_eq!(RoomCommand::Skip { player_id: "plr_1".into() }.name(), "skip");
        assert_eq!(RoomCommand::Timeout { question_id: "qst_1".into() }.name(), "timeout");
    }

    #[test]
    fn test_timeout_has_no_player() {
        assert_eq!(RoomCommand::Timeout { question_id: "qst_1".into() }.player_id(), None);
    }
}
