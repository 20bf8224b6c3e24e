//! Connection Hub (`spec.md` §4.4): per-PIN peer set, broadcasting the JSON
//! envelope to every socket and dropping peers whose send fails.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use axum::extract::ws::Message;
use tokio::sync::mpsc;

type PeerSender = mpsc::UnboundedSender<Message>;

#[derive(Default)]
pub struct Hub {
    rooms: RwLock<HashMap<String, HashMap<u64, PeerSender>>>,
    next_id: AtomicU64,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new peer for `pin`, returning its id (for later deregistration)
    /// and the receiving half it should forward to its socket write task.
    pub fn register(&self, pin: &str) -> (u64, mpsc::UnboundedReceiver<Message>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.rooms.write().unwrap().entry(pin.to_string()).or_default().insert(id, tx);
        (id, rx)
    }

    pub fn deregister(&self, pin: &str, id: u64) {
        let mut rooms = self.rooms.write().unwrap();
        if let Some(peers) = rooms.get_mut(pin) {
            peers.remove(&id);
            if peers.is_empty() {
                rooms.remove(pin);
            }
        }
    }

    /// Best-effort broadcast to every peer currently registered for `pin`. A peer
    /// whose channel is closed (socket write task has exited) is dropped.
    pub fn broadcast(&self, pin: &str, text: String) {
        let peers: Vec<(u64, PeerSender)> = {
            let rooms = self.rooms.read().unwrap();
            match rooms.get(pin) {
                Some(peers) => peers.iter().map(|(id, tx)| (*id, tx.clone())).collect(),
                None => return,
            }
        };

        let mut dead = Vec::new();
        for (id, tx) in &peers {
            if tx.send(Message::Text(text.clone().into())).is_err() {
                dead.push(*id);
            }
        }

        if !dead.is_empty() {
            let mut rooms = self.rooms.write().unwrap();
            if let Some(peers) = rooms.get_mut(pin) {
                for id in dead {
                    peers.remove(&id);
                }
                if peers.is_empty() {
                    rooms.remove(pin);
                }
            }
        }
    }

    pub fn peer_count(&self, pin: &str) -> usize {
        self.rooms.read().unwrap().get(pin).map(|p| p.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_all_registered_peers_and_drops_closed_ones() {
        let hub = Hub::new();
        let (id_a, mut rx_a) = hub.register("ABC123");
        let (_id_b, rx_b) = hub.register("ABC123");
        assert_eq!(hub.peer_count("ABC123"), 2);

        drop(rx_b);
        hub.broadcast("ABC123", "hello".to_string());
        assert_eq!(hub.peer_count("ABC123"), 1);

        let msg = rx_a.try_recv().unwrap();
        assert!(matches!(msg, Message::Text(t) if t == "hello"));

        hub.deregister("ABC123", id_a);
        assert_eq!(hub.peer_count("ABC123"), 0);
    }
}
