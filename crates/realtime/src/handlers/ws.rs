//! WebSocket upgrade handler (`spec.md` §6): the single realtime entry point,
//! `/ws/{pin}/{player_id}?token=<player_token>`. A raw `axum::extract::ws`
//! socket, not Socket.IO — one JSON envelope per frame, translated into the
//! engine's `RoomCommand`s and submitted to that room's actor.

use std::str::FromStr;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{http::StatusCode, Router};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use quizbattle_core::game::{Difficulty, HostAction, RoomCommand};
use quizbattle_protocol::socket::envelope::{ClientMessage, HostControlAction, ServerMessage};

use crate::actors::{dispatch, Inbound, Outcome};
use crate::rate_limit::ConnectionLimiter;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws/{pin}/{player_id}", get(upgrade))
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: String,
}

/// Protocol-violation close code (`spec.md` §7).
const CLOSE_PROTOCOL_VIOLATION: u16 = 1008;

async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path((pin, player_id)): Path<(String, String)>,
    Query(query): Query<WsQuery>,
) -> axum::response::Response {
    let pin = pin.to_uppercase();

    let player = match quizbattle_db::games::get_player_by_id(&state.db, &player_id).await {
        Ok(Some(player)) => player,
        Ok(None) => return (StatusCode::NOT_FOUND, "unknown player").into_response(),
        Err(err) => {
            tracing::error!(error = %err, "database error looking up player for websocket upgrade");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    if player.token != query.token {
        return (StatusCode::UNAUTHORIZED, "invalid player token").into_response();
    }

    let game = match quizbattle_db::games::get_by_id(&state.db, &player.game_id).await {
        Ok(Some(game)) => game,
        Ok(None) => return (StatusCode::NOT_FOUND, "unknown room").into_response(),
        Err(err) => {
            tracing::error!(error = %err, "database error looking up room for websocket upgrade");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };
    if game.pin != pin {
        return (StatusCode::NOT_FOUND, "player does not belong to this room").into_response();
    }

    let handle = match state.get_or_spawn_room(&pin).await {
        Ok(Some(handle)) => handle,
        Ok(None) => return (StatusCode::NOT_FOUND, "room has already finished").into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to spawn room actor for websocket upgrade");
            return (StatusCode::INTERNAL_SERVER_ERROR, "database error").into_response();
        }
    };

    let rate_limit_per_minute = state.config.rate_limit_per_minute;
    ws.on_upgrade(move |socket| {
        handle_socket(socket, state, handle.tx, pin, player_id, rate_limit_per_minute)
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: AppState,
    room_tx: tokio::sync::mpsc::Sender<crate::actors::Envelope>,
    pin: String,
    player_id: String,
    rate_limit_per_minute: u32,
) {
    let (peer_id, mut peer_rx) = state.hub.register(&pin);
    let (mut sink, mut stream) = socket.split();
    let (direct_tx, mut direct_rx) = tokio::sync::mpsc::unbounded_channel::<Message>();

    // Initial snapshot so the client has state without waiting on the next broadcast.
    if let Outcome::Applied { snapshot } = dispatch(&room_tx, Inbound::Query).await
        && let Ok(text) = serde_json::to_string(&ServerMessage::State(snapshot))
    {
        let _ = direct_tx.send(Message::Text(text.into()));
    }

    let mut forward_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                message = peer_rx.recv() => {
                    match message {
                        Some(message) => if sink.send(message).await.is_err() { break },
                        None => break,
                    }
                }
                message = direct_rx.recv() => {
                    match message {
                        Some(message) => if sink.send(message).await.is_err() { break },
                        None => break,
                    }
                }
            }
        }
    });

    let limiter = ConnectionLimiter::new(rate_limit_per_minute);
    let mut protocol_violation_reason: Option<String> = None;

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => continue,
        };

        if !limiter.check() {
            continue;
        }

        let Ok(client_message) = serde_json::from_str::<ClientMessage>(&text) else {
            protocol_violation_reason = Some("malformed message".to_string());
            break;
        };

        if matches!(client_message, ClientMessage::Ping) {
            if let Ok(text) = serde_json::to_string(&ServerMessage::Pong) {
                let _ = direct_tx.send(Message::Text(text.into()));
            }
            continue;
        }

        let command = match build_command(&player_id, client_message) {
            Ok(command) => command,
            Err(()) => {
                protocol_violation_reason = Some("malformed host-control payload".to_string());
                break;
            }
        };

        let inbound = match command {
            RestartOrCommand::Restart { topic, difficulty } => {
                Inbound::Restart { player_id: player_id.clone(), topic, difficulty }
            }
            RestartOrCommand::Command(command) => Inbound::Command(command),
        };

        if let Outcome::Rejected { code, message, .. } = dispatch(&room_tx, inbound).await {
            tracing::debug!(pin = %pin, player_id = %player_id, code = %code, message = %message, "command rejected, closing socket");
            protocol_violation_reason = Some(message);
            break;
        }
    }

    if let Some(reason) = protocol_violation_reason {
        tracing::debug!(pin = %pin, player_id = %player_id, reason = %reason, "closing socket for protocol violation");
        let close = Message::Close(Some(CloseFrame { code: CLOSE_PROTOCOL_VIOLATION, reason: reason.into() }));
        let _ = direct_tx.send(close);
        // Give the forward task a chance to flush the close frame before it's aborted.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    forward_task.abort();
    state.hub.deregister(&pin, peer_id);

    let _ = dispatch(&room_tx, Inbound::Command(RoomCommand::Disconnect { player_id })).await;
}

enum RestartOrCommand {
    Command(RoomCommand),
    Restart { topic: Option<String>, difficulty: Option<Difficulty> },
}

/// Translate a wire `ClientMessage` into the engine's `RoomCommand`, or `Err`
/// if it names a malformed difficulty (a protocol violation, `spec.md` §7).
fn build_command(player_id: &str, message: ClientMessage) -> Result<RestartOrCommand, ()> {
    let player_id = player_id.to_string();
    Ok(match message {
        ClientMessage::Answer { option_index } => {
            RestartOrCommand::Command(RoomCommand::Answer { player_id, option_index })
        }
        ClientMessage::Vote { choice } => RestartOrCommand::Command(RoomCommand::Vote { player_id, choice }),
        ClientMessage::Skip => RestartOrCommand::Command(RoomCommand::Skip { player_id }),
        ClientMessage::TransferCaptain { to_player_id } => {
            RestartOrCommand::Command(RoomCommand::TransferCaptain { player_id, to_player_id })
        }
        ClientMessage::HostControl { control_action: HostControlAction::Restart, topic, difficulty, .. } => {
            let difficulty = difficulty.map(|d| Difficulty::from_str(&d)).transpose().map_err(|_| ())?;
            RestartOrCommand::Restart { topic, difficulty }
        }
        ClientMessage::HostControl { control_action, target_player_id, .. } => {
            let action = match control_action {
                HostControlAction::Pause => HostAction::Pause,
                HostControlAction::Resume => HostAction::Resume,
                HostControlAction::NextQuestion => HostAction::NextQuestion,
                HostControlAction::Kick => {
                    let target_player_id = target_player_id.ok_or(())?;
                    HostAction::Kick { target_player_id }
                }
                HostControlAction::Restart => unreachable!("handled above"),
            };
            RestartOrCommand::Command(RoomCommand::HostControl { player_id, action })
        }
        ClientMessage::Ping => unreachable!("handled by the caller before build_command"),
    })
}
