//! Wire format for the bidirectional room socket (`spec.md` §6, §4.4).
//!
//! The connection is a raw `axum::extract::ws` socket at
//! `/ws/{pin}/{player_id}?token=<player_token>`; every frame is a single JSON
//! object tagged by `action` (client→server) or `type` (server→client).

use serde::{Deserialize, Serialize};

/// A message sent from a connected client to the room actor.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    Answer { option_index: u8 },
    Vote { choice: String },
    Skip,
    TransferCaptain { to_player_id: String },
    HostControl {
        control_action: HostControlAction,
        target_player_id: Option<String>,
        topic: Option<String>,
        difficulty: Option<String>,
    },
    Ping,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HostControlAction {
    Pause,
    Resume,
    NextQuestion,
    Kick,
    Restart,
}

/// An answer-result notification body, echoed ahead of the `state` snapshot
/// that reflects the same commitment (`spec.md` §5 ordering guarantee).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerResultBody {
    pub timeout: bool,
    pub skip: bool,
    pub correct: bool,
    pub correct_option: u8,
    pub team: String,
    pub question_id: String,
}

/// A message broadcast from the room actor to every connected client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", content = "data")]
pub enum ServerMessage {
    State(serde_json::Value),
    AnswerResult(AnswerResultBody),
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_answer_action() {
        let msg: ClientMessage = serde_json::from_str(r#"{"action":"answer","option_index":2}"#).unwrap();
        assert_eq!(msg, ClientMessage::Answer { option_index: 2 });
    }

    #[test]
    fn parses_host_control_with_optional_fields() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"action":"host_control","control_action":"kick","target_player_id":"plr_1"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::HostControl { control_action, target_player_id, topic, difficulty } => {
                assert_eq!(control_action, HostControlAction::Kick);
                assert_eq!(target_player_id.as_deref(), Some("plr_1"));
                assert!(topic.is_none());
                assert!(difficulty.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn serializes_server_message_envelope() {
        let msg = ServerMessage::Pong;
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "pong");
    }

    #[test]
    fn serializes_answer_result_envelope() {
        let msg = ServerMessage::AnswerResult(AnswerResultBody {
            timeout: false,
            skip: false,
            correct: true,
            correct_option: 1,
            team: "A".to_string(),
            question_id: "qst_1".to_string(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "answer_result");
        assert_eq!(json["data"]["correct_option"], 1);
    }
}
