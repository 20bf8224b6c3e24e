//! Prefixed nanoid generation for entity identifiers, plus room PINs.
//!
//! Entities use prefixed nanoid identifiers instead of UUIDs:
//! - Human-readable prefixes identify entity type at a glance
//! - URL-safe characters (no encoding needed)
//! - ~71 bits entropy for entities, 256 bits for sessions (see `session.rs`)
//!
//! Room PINs are a separate, much shorter identifier meant to be read aloud or typed
//! on a phone: 6 characters drawn uniformly from `[A-Z0-9]`.

use once_cell::sync::Lazy;
use rand::Rng;
use rand::rngs::OsRng;
use std::sync::Mutex;

/// Thread-safe RNG for ID generation.
static RNG: Lazy<Mutex<OsRng>> = Lazy::new(|| Mutex::new(OsRng));

/// Alphabet for nanoid generation (URL-safe).
const ALPHABET: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '_', 'a',
    'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't',
    'u', 'v', 'w', 'x', 'y', 'z',
];

/// PIN alphabet: uppercase letters and digits only, the set a player reads off a screen.
const PIN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Entity ID length (excluding prefix). Provides ~71 bits entropy.
const ENTITY_ID_LEN: usize = 12;

/// Session ID length (excluding prefix). Provides ~256 bits entropy.
const SESSION_ID_LEN: usize = 43;

/// Room PIN length.
pub const PIN_LEN: usize = 6;

/// Generate a random string of the specified length using the nanoid alphabet.
fn generate_id(len: usize) -> String {
    let mut rng = RNG.lock().expect("RNG lock poisoned");
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..ALPHABET.len());
            ALPHABET[idx]
        })
        .collect()
}

/// Entity prefixes for different types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityPrefix {
    User,
    Game,
    Player,
    Session,
    Question,
}

impl EntityPrefix {
    /// Returns the string prefix for this entity type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "usr_",
            EntityPrefix::Game => "gam_",
            EntityPrefix::Player => "plr_",
            EntityPrefix::Session => "ses_",
            EntityPrefix::Question => "qst_",
        }
    }
}

/// Generate a prefixed ID for a user entity.
/// Format: `usr_XXXXXXXXXXXX` (16 chars total, ~71 bits entropy)
pub fn generate_user_id() -> String {
    format!("{}{}", EntityPrefix::User.as_str(), generate_id(ENTITY_ID_LEN))
}

/// Generate a prefixed ID for a game (room) entity.
/// Format: `gam_XXXXXXXXXXXX` (16 chars total, ~71 bits entropy)
pub fn generate_game_id() -> String {
    format!("{}{}", EntityPrefix::Game.as_str(), generate_id(ENTITY_ID_LEN))
}

/// Generate a prefixed ID for a player (room membership) entity.
/// Format: `plr_XXXXXXXXXXXX` (16 chars total, ~71 bits entropy)
pub fn generate_player_id() -> String {
    format!("{}{}", EntityPrefix::Player.as_str(), generate_id(ENTITY_ID_LEN))
}

/// Generate a prefixed ID for a session entity.
/// Format: `ses_XXXXXXXXXXX...` (47 chars total, ~256 bits entropy)
pub fn generate_session_id() -> String {
    format!("{}{}", EntityPrefix::Session.as_str(), generate_id(SESSION_ID_LEN))
}

/// Generate a prefixed ID for a question entity.
/// Format: `qst_XXXXXXXXXXXX` (16 chars total, ~71 bits entropy)
pub fn generate_question_id() -> String {
    format!("{}{}", EntityPrefix::Question.as_str(), generate_id(ENTITY_ID_LEN))
}

/// Parse the prefix from an ID string.
/// Returns `None` if the ID doesn't have a recognized prefix.
pub fn parse_prefix(id: &str) -> Option<EntityPrefix> {
    if id.starts_with("usr_") {
        Some(EntityPrefix::User)
    } else if id.starts_with("gam_") {
        Some(EntityPrefix::Game)
    } else if id.starts_with("plr_") {
        Some(EntityPrefix::Player)
    } else if id.starts_with("ses_") {
        Some(EntityPrefix::Session)
    } else if id.starts_with("qst_") {
        Some(EntityPrefix::Question)
    } else {
        None
    }
}

/// Generate a 6-character room PIN from `[A-Z0-9]`.
///
/// Uniqueness across live (non-finished) rooms is the Repository's job, not this
/// generator's; callers should retry on a unique-constraint violation.
pub fn generate_pin() -> String {
    let mut rng = RNG.lock().expect("RNG lock poisoned");
    (0..PIN_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..PIN_ALPHABET.len());
            PIN_ALPHABET[idx] as char
        })
        .collect()
}

/// Normalize a user-supplied PIN to the canonical uppercase form.
pub fn normalize_pin(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_format() {
        let id = generate_user_id();
        assert!(id.starts_with("usr_"));
        assert_eq!(id.len(), 16);
    }

    #[test]
    fn test_game_id_format() {
        let id = generate_game_id();
        assert!(id.starts_with("gam_"));
        assert_eq!(id.len(), 16);
    }

    #[test]
    fn test_player_id_format() {
        let id = generate_player_id();
        assert!(id.starts_with("plr_"));
        assert_eq!(id.len(), 16);
    }

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        assert!(id.starts_with("ses_"));
        assert_eq!(id.len(), 47);
    }

    #[test]
    fn test_question_id_format() {
        let id = generate_question_id();
        assert!(id.starts_with("qst_"));
        assert_eq!(id.len(), 16);
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: Vec<String> = (0..100).map(|_| generate_user_id()).collect();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len());
    }

    #[test]
    fn test_parse_prefix() {
        assert_eq!(parse_prefix("usr_abcdefghijkl"), Some(EntityPrefix::User));
        assert_eq!(parse_prefix("gam_abcdefghijkl"), Some(EntityPrefix::Game));
        assert_eq!(parse_prefix("plr_abcdefghijkl"), Some(EntityPrefix::Player));
        assert_eq!(parse_prefix("ses_abcdefghijkl"), Some(EntityPrefix::Session));
        assert_eq!(parse_prefix("qst_abcdefghijkl"), Some(EntityPrefix::Question));
        assert_eq!(parse_prefix("unknown_id"), None);
    }

    #[test]
    fn test_pin_format() {
        let pin = generate_pin();
        assert_eq!(pin.len(), PIN_LEN);
        assert!(pin.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_pin_distribution_is_not_constant() {
        let pins: std::collections::HashSet<String> = (0..50).map(|_| generate_pin()).collect();
        assert!(pins.len() > 1);
    }

    #[test]
    fn test_normalize_pin() {
        assert_eq!(normalize_pin(" abc123 "), "ABC123");
        assert_eq!(normalize_pin("ABC123"), "ABC123");
    }
}
