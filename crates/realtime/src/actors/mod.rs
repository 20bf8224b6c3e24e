//! Per-room actors: one task per live room, owning its `RoomState` exclusively.

pub mod room_actor;

pub use room_actor::{spawn, Envelope, Inbound, Outcome};

use quizbattle_core::game::ErrorCategory;
use tokio::sync::{mpsc, oneshot};

/// Submit `inbound` to a room's actor and wait for its reply. Used by both the
/// HTTP routes (which need the resulting snapshot in their response body) and
/// the WebSocket handler (which needs to know whether to close the socket).
pub async fn dispatch(tx: &mpsc::Sender<Envelope>, inbound: Inbound) -> Outcome {
    let (reply, rx) = oneshot::channel();
    if tx.send(Envelope { inbound, reply: Some(reply) }).await.is_err() {
        return Outcome::Rejected {
            category: ErrorCategory::NotFound,
            code: "ROOM_GONE".into(),
            message: "room actor is no longer running".into(),
        };
    }
    rx.await.unwrap_or(Outcome::Rejected {
        category: ErrorCategory::NotFound,
        code: "ROOM_GONE".into(),
        message: "room actor dropped the reply channel".into(),
    })
}
