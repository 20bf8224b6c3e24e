//! Room configuration and difficulty-driven timing rules.

use serde::{Deserialize, Serialize};

/// Question difficulty, which drives the per-question timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Base per-question timeout in seconds, before any pause/resume adjustment.
    pub fn base_timeout_secs(&self) -> u32 {
        match self {
            Difficulty::Easy => 35,
            Difficulty::Medium => 30,
            Difficulty::Hard => 25,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("Invalid difficulty: {other}")),
        }
    }
}

/// Per-room configuration, fixed at creation and replaced wholesale on restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Number of questions each team answers (5, 6, or 7).
    pub questions_per_team: u8,
    pub difficulty: Difficulty,
}

impl RoomConfig {
    pub fn base_timeout_secs(&self) -> u32 {
        self.difficulty.base_timeout_secs()
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self { questions_per_team: 5, difficulty: Difficulty::Medium }
    }
}

/// Maximum score a single correct answer can be worth (1 base + 2 speed bonus).
pub const MAX_AWARD_PER_QUESTION: u32 = 3;

/// Duration of the countdown phase, in whole seconds.
pub const COUNTDOWN_SECONDS: u8 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_timeouts() {
        assert_eq!(Difficulty::Easy.base_timeout_secs(), 35);
        assert_eq!(Difficulty::Medium.base_timeout_secs(), 30);
        assert_eq!(Difficulty::Hard.base_timeout_secs(), 25);
    }

    #[test]
    fn test_default_config() {
        let config = RoomConfig::default();
        assert_eq!(config.questions_per_team, 5);
        assert_eq!(config.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!("EASY".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!("extreme".parse::<Difficulty>().is_err());
    }
}
