//! Room actor: the Command Dispatcher and Deadline Timer for a single room
//! (`spec.md` §4.1-§4.3). Owns a `RoomState` exclusively; every command
//! addressed to it is applied through the pure reducer and serialized by the
//! actor's single-consumer `mpsc` inbox.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use quizbattle_core::game::deck::{build_deck, OracleQuestion};
use quizbattle_core::game::{
    advance_countdown, begin_first_question, reduce, project, Difficulty, ErrorCategory, HostAction, RoomCommand,
    RoomPhase, RoomState, RoomStatus,
};
use quizbattle_db::DbPool;
use quizbattle_oracle::QuestionProvider;
use quizbattle_protocol::socket::envelope::{AnswerResultBody, ServerMessage};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::hub::Hub;

/// What a connection actually wants applied; `Restart` is split out from
/// `Command` because building its deck requires an async oracle call the
/// reducer itself never performs (`quizbattle-core`'s documented contract).
#[derive(Debug)]
pub enum Inbound {
    Command(RoomCommand),
    Restart { player_id: String, topic: Option<String>, difficulty: Option<Difficulty> },
    /// Request a snapshot without mutating state, for `GET /games/{pin}`.
    Query,
}

#[derive(Debug)]
pub enum Outcome {
    /// Carries the post-command snapshot so a synchronous HTTP caller (`create`,
    /// `join`, `start`) can hand it straight back in its response body.
    Applied { snapshot: serde_json::Value },
    /// `category` is the `spec.md` §7 taxonomy bucket the HTTP layer maps to a
    /// status code; the WebSocket handler ignores it and always closes with 1008.
    Rejected { category: ErrorCategory, code: String, message: String },
}

pub struct Envelope {
    pub inbound: Inbound,
    pub reply: Option<oneshot::Sender<Outcome>>,
}

/// Spawn a room's actor task, returning the sender new connections use to submit commands.
pub fn spawn(
    db: DbPool,
    hub: Arc<Hub>,
    oracle: Arc<dyn QuestionProvider>,
    game_id: String,
    pin: String,
    state: RoomState,
) -> mpsc::Sender<Envelope> {
    let (tx, rx) = mpsc::channel(128);
    tokio::spawn(run(db, hub, oracle, game_id, pin, state, rx, tx.clone()));
    tx
}

async fn run(
    db: DbPool,
    hub: Arc<Hub>,
    oracle: Arc<dyn QuestionProvider>,
    game_id: String,
    pin: String,
    mut state: RoomState,
    mut rx: mpsc::Receiver<Envelope>,
    self_tx: mpsc::Sender<Envelope>,
) {
    let mut rng = ChaCha20Rng::from_entropy();
    let mut deadline: Option<JoinHandle<()>> = None;

    rearm_deadline(&state, &pin, &self_tx, &mut deadline);
    broadcast_snapshot(&hub, &pin, &state);

    while let Some(Envelope { inbound, reply }) = rx.recv().await {
        if matches!(inbound, Inbound::Query) {
            if let Some(reply) = reply {
                let _ = reply.send(Outcome::Applied { snapshot: snapshot_value(&state) });
            }
            continue;
        }

        let old_status = state.status;

        let command = match inbound {
            Inbound::Query => unreachable!("handled above"),
            Inbound::Command(cmd) => cmd,
            Inbound::Restart { player_id, topic, difficulty } => {
                match build_restart_command(&state, &*oracle, &mut rng, player_id, topic, difficulty).await {
                    Ok(cmd) => cmd,
                    Err((category, code, message)) => {
                        if let Some(reply) = reply {
                            let _ = reply.send(Outcome::Rejected { category, code, message });
                        }
                        continue;
                    }
                }
            }
        };

        let is_restart = matches!(&command, RoomCommand::HostControl { action: HostAction::Restart { .. }, .. });
        let result = reduce(&state, command, Utc::now(), &mut rng);

        if let Some(error) = result.get_error() {
            if let quizbattle_core::game::RoomEvent::Error { category, code, message } = error {
                tracing::debug!(pin = %pin, code = %code, "command rejected");
                if let Some(reply) = reply {
                    let _ =
                        reply.send(Outcome::Rejected { category: *category, code: code.clone(), message: message.clone() });
                }
            }
            continue;
        }

        state = result.state;

        if is_restart {
            let rows = quizbattle_db::room_sync::deck_to_rows(&state.deck);
            if let Err(err) = quizbattle_db::questions::delete_by_room(&db, &game_id).await {
                tracing::error!(pin = %pin, error = %err, "failed to clear deck on restart");
            }
            if let Err(err) = quizbattle_db::questions::insert_deck(&db, &game_id, &rows).await {
                tracing::error!(pin = %pin, error = %err, "failed to persist restarted deck");
            }
        }

        if let Err(err) = quizbattle_db::room_sync::persist_room_state(&db, &game_id, &state).await {
            tracing::error!(pin = %pin, error = %err, "failed to persist room state");
        }

        for event in &result.events {
            if let quizbattle_core::game::RoomEvent::AnswerResult { timeout, skip, correct, correct_option, team, question_id } =
                event
            {
                let body = AnswerResultBody {
                    timeout: *timeout,
                    skip: *skip,
                    correct: *correct,
                    correct_option: *correct_option,
                    team: team.to_string(),
                    question_id: question_id.clone(),
                };
                broadcast(&hub, &pin, &ServerMessage::AnswerResult(body));
            }
        }

        if old_status != RoomStatus::Finished && state.status == RoomStatus::Finished {
            finalize_stats(&db, &pin, &state).await;
        }

        if let Some(reply) = reply {
            let _ = reply.send(Outcome::Applied { snapshot: snapshot_value(&state) });
        }

        if state.phase == RoomPhase::Countdown {
            run_countdown(&hub, &db, &game_id, &pin, &mut state).await;
        }

        broadcast_snapshot(&hub, &pin, &state);
        rearm_deadline(&state, &pin, &self_tx, &mut deadline);
    }

    if let Some(handle) = deadline.take() {
        handle.abort();
    }
    tracing::info!(pin = %pin, "room actor shut down");
}

/// Cooperative countdown loop (`spec.md` §5's documented yield point): other
/// commands queue in the inbox but are not read again until this returns.
async fn run_countdown(hub: &Hub, db: &DbPool, game_id: &str, pin: &str, state: &mut RoomState) {
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let still_counting = advance_countdown(state);
        if still_counting {
            broadcast_snapshot(hub, pin, state);
        } else {
            break;
        }
    }

    begin_first_question(state, Utc::now());
    if let Err(err) = quizbattle_db::room_sync::persist_room_state(db, game_id, state).await {
        tracing::error!(pin = %pin, error = %err, "failed to persist room state after countdown");
    }
}

async fn build_restart_command(
    state: &RoomState,
    oracle: &dyn QuestionProvider,
    rng: &mut ChaCha20Rng,
    player_id: String,
    topic: Option<String>,
    difficulty: Option<Difficulty>,
) -> Result<RoomCommand, (ErrorCategory, String, String)> {
    if state.player(&player_id).map(|p| p.is_host) != Some(true) {
        return Err((ErrorCategory::Forbidden, "NOT_HOST".into(), "only the host may issue this control".into()));
    }
    if state.status != RoomStatus::Finished {
        return Err((ErrorCategory::Conflict, "NOT_FINISHED".into(), "can only restart a finished game".into()));
    }

    let effective_difficulty = difficulty.unwrap_or(state.config.difficulty);
    let effective_topic = topic.clone().unwrap_or_else(|| state.topic.clone());
    let count = 2 * state.config.questions_per_team as usize;

    let batch = quizbattle_oracle::fetch(Some(oracle), &effective_topic, &effective_difficulty.to_string(), count, rng)
        .await
        .map_err(|err| (ErrorCategory::Validation, "ORACLE_FAILURE".to_string(), err.to_string()))?;

    let oracle_questions: Vec<OracleQuestion> = batch
        .into_iter()
        .map(|q| OracleQuestion { text: q.text, options: q.options, correct_option: q.correct_option })
        .collect();

    let deck = build_deck(oracle_questions, state.config.questions_per_team, quizbattle_core::generate_question_id, rng);

    Ok(RoomCommand::HostControl { player_id, action: HostAction::Restart { topic, difficulty, deck } })
}

/// Update each registered user's aggregate stats once, at the waiting→finished
/// edge (`spec.md`'s supplemented `users` aggregate fields).
async fn finalize_stats(db: &DbPool, pin: &str, state: &RoomState) {
    use quizbattle_core::game::Team;

    let winner = if state.score_a > state.score_b {
        Some(Team::A)
    } else if state.score_b > state.score_a {
        Some(Team::B)
    } else {
        None
    };

    for player in &state.players {
        let Some(user_id) = player.user_id.as_deref() else { continue };
        let Some(team) = player.team else { continue };
        let score = state.score(team) as i32;
        let won = winner == Some(team);
        if let Err(err) = quizbattle_db::users::update_stats_after_game(db, user_id, score, won).await {
            tracing::error!(pin = %pin, user_id = %user_id, error = %err, "failed to update user stats");
        }
    }
}

fn broadcast(hub: &Hub, pin: &str, message: &ServerMessage) {
    match serde_json::to_string(message) {
        Ok(text) => hub.broadcast(pin, text),
        Err(err) => tracing::error!(pin = %pin, error = %err, "failed to serialize server message"),
    }
}

/// Snapshot a room's state as the `serde_json::Value` an HTTP response embeds.
fn snapshot_value(state: &RoomState) -> serde_json::Value {
    serde_json::to_value(project(state, Utc::now())).unwrap_or(serde_json::Value::Null)
}

fn broadcast_snapshot(hub: &Hub, pin: &str, state: &RoomState) {
    let snapshot = project(state, Utc::now());
    match serde_json::to_value(&snapshot) {
        Ok(value) => broadcast(hub, pin, &ServerMessage::State(value)),
        Err(err) => tracing::error!(pin = %pin, error = %err, "failed to serialize snapshot"),
    }
}

/// Cancel any outstanding Deadline Timer and, if the room just entered (or
/// remains in) `question`, arm a fresh one for the remaining time
/// (`spec.md` §4.2).
fn rearm_deadline(state: &RoomState, pin: &str, tx: &mpsc::Sender<Envelope>, handle: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = handle.take() {
        handle.abort();
    }

    if state.phase != RoomPhase::Question {
        return;
    }
    let Some(question_id) = state.current_question().map(|q| q.id.clone()) else { return };
    let Some(remaining) = state.question_deadline_remaining_secs(Utc::now()) else { return };
    let remaining = remaining.max(0) as u64;

    tracing::debug!(pin = %pin, question_id = %question_id, remaining, "deadline timer armed");

    let tx = tx.clone();
    *handle = Some(tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(remaining)).await;
        let _ = tx.send(Envelope { inbound: Inbound::Command(RoomCommand::Timeout { question_id }), reply: None }).await;
    }));
}
