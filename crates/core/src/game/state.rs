//! Room state types for the shared reducer pattern.
//!
//! `RoomState` is the canonical, authoritative state a room's actor owns. The
//! reducer in `reducer.rs` is the only thing that mutates it; the projector in this
//! module turns it into the public `Snapshot` broadcast to sockets.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rules::{Difficulty, RoomConfig};

/// Top-level room status, persisted to the `games` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Finished,
}

/// Sub-phase within a room's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    Gathering,
    Countdown,
    Question,
    Paused,
    Results,
}

/// A team identifier. There is no "none" variant here; absence of a team is
/// represented by `Option<Team>` at the call site, matching `spec.md`'s
/// `current_team ∈ {A, B, none}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Team {
    A,
    B,
}

impl Team {
    pub fn other(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::A => write!(f, "A"),
            Team::B => write!(f, "B"),
        }
    }
}

/// A member of a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub team: Option<Team>,
    pub is_host: bool,
    pub is_captain: bool,
    pub active: bool,
    pub joined_at: DateTime<Utc>,
}

impl PlayerState {
    pub fn new(id: String, user_id: Option<String>, name: String, is_host: bool, joined_at: DateTime<Utc>) -> Self {
        Self { id, user_id, name, team: None, is_host, is_captain: false, active: true, joined_at }
    }
}

/// A single deck entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionState {
    pub id: String,
    pub team: Team,
    pub order_index: u8,
    pub text: String,
    pub options: [String; 4],
    /// Zero-based (see `spec.md` §9's asymmetry note: the oracle returns 1-based,
    /// conversion happens once at deck-build time).
    pub correct_option: u8,
    pub answered: bool,
}

/// Per-team aggregate counters, cleared only by a full restart.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TeamStats {
    pub correct: u32,
    pub incorrect: u32,
    pub timeout: u32,
    pub speed_bonus: u32,
}

/// The authoritative, in-memory room state a single actor owns exclusively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomState {
    pub pin: String,
    pub topic: String,
    pub config: RoomConfig,
    pub status: RoomStatus,
    pub phase: RoomPhase,
    pub current_team: Option<Team>,
    pub current_index_a: u8,
    pub current_index_b: u8,
    pub score_a: u32,
    pub score_b: u32,
    pub question_started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub players: Vec<PlayerState>,
    pub deck: Vec<QuestionState>,
    /// Advisory, non-committing choices for the current question, cleared on every
    /// question transition. Keyed by player id.
    pub votes: HashMap<String, String>,
    pub stats_a: TeamStats,
    pub stats_b: TeamStats,
    pub paused_remaining_secs: Option<u32>,
    pub paused_elapsed_secs: Option<u32>,
    /// `3, 2, 1` during the countdown sub-steps, `0` otherwise.
    pub countdown_seconds: u8,
}

impl RoomState {
    pub fn new(pin: String, topic: String, config: RoomConfig, host: PlayerState, deck: Vec<QuestionState>, now: DateTime<Utc>) -> Self {
        Self {
            pin,
            topic,
            config,
            status: RoomStatus::Waiting,
            phase: RoomPhase::Gathering,
            current_team: None,
            current_index_a: 0,
            current_index_b: 0,
            score_a: 0,
            score_b: 0,
            question_started_at: None,
            created_at: now,
            players: vec![host],
            deck,
            votes: HashMap::new(),
            stats_a: TeamStats::default(),
            stats_b: TeamStats::default(),
            paused_remaining_secs: None,
            paused_elapsed_secs: None,
            countdown_seconds: 0,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut PlayerState> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn active_players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.iter().filter(|p| p.active)
    }

    pub fn active_team_members(&self, team: Team) -> impl Iterator<Item = &PlayerState> {
        self.players.iter().filter(move |p| p.active && p.team == Some(team))
    }

    pub fn host(&self) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.is_host)
    }

    pub fn captain_of(&self, team: Team) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.active && p.team == Some(team) && p.is_captain)
    }

    pub fn current_index(&self, team: Team) -> u8 {
        match team {
            Team::A => self.current_index_a,
            Team::B => self.current_index_b,
        }
    }

    pub fn set_current_index(&mut self, team: Team, value: u8) {
        match team {
            Team::A => self.current_index_a = value,
            Team::B => self.current_index_b = value,
        }
    }

    pub fn score(&self, team: Team) -> u32 {
        match team {
            Team::A => self.score_a,
            Team::B => self.score_b,
        }
    }

    pub fn add_score(&mut self, team: Team, amount: u32) {
        match team {
            Team::A => self.score_a += amount,
            Team::B => self.score_b += amount,
        }
    }

    pub fn stats(&self, team: Team) -> TeamStats {
        match team {
            Team::A => self.stats_a,
            Team::B => self.stats_b,
        }
    }

    pub fn stats_mut(&mut self, team: Team) -> &mut TeamStats {
        match team {
            Team::A => &mut self.stats_a,
            Team::B => &mut self.stats_b,
        }
    }

    /// The question currently awaiting commitment, if any.
    pub fn current_question(&self) -> Option<&QuestionState> {
        let team = self.current_team?;
        let idx = self.current_index(team);
        self.deck.iter().find(|q| q.team == team && q.order_index == idx && !q.answered)
    }

    pub fn current_question_mut(&mut self) -> Option<&mut QuestionState> {
        let team = self.current_team?;
        let idx = self.current_index(team);
        self.deck.iter_mut().find(|q| q.team == team && q.order_index == idx && !q.answered)
    }

    pub fn question_by_id_mut(&mut self, question_id: &str) -> Option<&mut QuestionState> {
        self.deck.iter_mut().find(|q| q.id == question_id)
    }

    /// Whether both teams have consumed their entire deck.
    pub fn deck_exhausted(&self) -> bool {
        self.current_index_a >= self.config.questions_per_team && self.current_index_b >= self.config.questions_per_team
    }

    /// Seconds remaining until the current question's deadline, used by the room
    /// actor to (re-)arm the Deadline Timer after a `start`/`resume` transition.
    /// Not clamped to zero, unlike the projector's `question_seconds_left`.
    pub fn question_deadline_remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        let started = self.question_started_at?;
        let elapsed = (now - started).num_seconds();
        Some(self.config.base_timeout_secs() as i64 - elapsed)
    }
}

/// A question as seen by clients: no `correct_option`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: String,
    pub team: Team,
    pub order_index: u8,
    pub text: String,
    pub options: [String; 4],
}

/// A player as seen by clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicPlayer {
    pub id: String,
    pub name: String,
    pub team: Option<Team>,
    pub is_host: bool,
    pub is_captain: bool,
}

/// Final outcome, populated only once `status = finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    A,
    B,
    Draw,
}

/// The public projection of a room's state, broadcast over the socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub pin: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub status: RoomStatus,
    pub phase: RoomPhase,
    pub countdown_seconds: u8,
    pub questions_per_team: u8,
    pub current_team: Option<Team>,
    pub score_a: u32,
    pub score_b: u32,
    pub current_question: Option<PublicQuestion>,
    pub players: Vec<PublicPlayer>,
    pub winner: Option<Winner>,
    pub team_stats_a: TeamStats,
    pub team_stats_b: TeamStats,
    pub vote_percentages: HashMap<String, u32>,
    pub question_seconds_left: Option<i64>,
}

/// Pure projection of a `RoomState` into its public `Snapshot`. Never reveals
/// `correct_option`.
pub fn project(state: &RoomState, now: DateTime<Utc>) -> Snapshot {
    let current_question = state.current_question().map(|q| PublicQuestion {
        id: q.id.clone(),
        team: q.team,
        order_index: q.order_index,
        text: q.text.clone(),
        options: q.options.clone(),
    });

    let players = state
        .players
        .iter()
        .map(|p| PublicPlayer {
            id: p.id.clone(),
            name: p.name.clone(),
            team: p.team,
            is_host: p.is_host,
            is_captain: p.is_captain,
        })
        .collect();

    let winner = match state.status {
        RoomStatus::Finished => Some(if state.score_a > state.score_b {
            Winner::A
        } else if state.score_b > state.score_a {
            Winner::B
        } else {
            Winner::Draw
        }),
        _ => None,
    };

    let vote_percentages = vote_percentages(&state.votes);

    let question_seconds_left = match state.phase {
        RoomPhase::Question => state.question_started_at.map(|started| {
            let elapsed = (now - started).num_seconds();
            (state.config.base_timeout_secs() as i64 - elapsed).max(0)
        }),
        RoomPhase::Paused => state.paused_remaining_secs.map(|s| s as i64),
        _ => None,
    };

    Snapshot {
        pin: state.pin.clone(),
        topic: state.topic.clone(),
        difficulty: state.config.difficulty,
        status: state.status,
        phase: state.phase,
        countdown_seconds: state.countdown_seconds,
        questions_per_team: state.config.questions_per_team,
        current_team: state.current_team,
        score_a: state.score_a,
        score_b: state.score_b,
        current_question,
        players,
        winner,
        team_stats_a: state.stats_a,
        team_stats_b: state.stats_b,
        vote_percentages,
        question_seconds_left,
    }
}

/// Truncated integer percentages per distinct vote choice.
fn vote_percentages(votes: &HashMap<String, String>) -> HashMap<String, u32> {
    if votes.is_empty() {
        return HashMap::new();
    }

    let total = votes.len() as u32;
    let mut counts: HashMap<String, u32> = HashMap::new();
    for choice in votes.values() {
        *counts.entry(choice.clone()).or_insert(0) += 1;
    }

    counts.into_iter().map(|(choice, count)| (choice, count * 100 / total)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> RoomState {
        let now = Utc::now();
        let host = PlayerState::new("plr_host".into(), None, "Host".into(), true, now);
        RoomState::new("ABC123".into(), "Geography".into(), RoomConfig::default(), host, Vec::new(), now)
    }

    #[test]
    fn test_new_room_state() {
        let state = sample_state();
        assert_eq!(state.status, RoomStatus::Waiting);
        assert_eq!(state.phase, RoomPhase::Gathering);
        assert!(state.current_team.is_none());
        assert_eq!(state.players.len(), 1);
    }

    #[test]
    fn test_team_other() {
        assert_eq!(Team::A.other(), Team::B);
        assert_eq!(Team::B.other(), Team::A);
    }

    #[test]
    fn test_vote_percentages_truncate() {
        let mut votes = HashMap::new();
        votes.insert("p1".to_string(), "opt1".to_string());
        votes.insert("p2".to_string(), "opt1".to_string());
        votes.insert("p3".to_string(), "opt2".to_string());

        let pct = vote_percentages(&votes);
        assert_eq!(pct.get("opt1"), Some(&66));
        assert_eq!(pct.get("opt2"), Some(&33));
    }

    #[test]
    fn test_projection_hides_correct_option() {
        let mut state = sample_state();
        state.current_team = Some(Team::A);
        state.status = RoomStatus::InProgress;
        state.phase = RoomPhase::Question;
        state.question_started_at = Some(Utc::now());
        state.deck.push(QuestionState {
            id: "qst_1".into(),
            team: Team::A,
            order_index: 0,
            text: "2+2?".into(),
            options: ["3".into(), "4".into(), "5".into(), "6".into()],
            correct_option: 1,
            answered: false,
        });

        let snapshot = project(&state, Utc::now());
        let serialized = serde_json::to_string(&snapshot).unwrap();
        assert!(!serialized.contains("correct_option"));
    }

    #[test]
    fn test_deck_exhausted() {
        let mut state = sample_state();
        assert!(!state.deck_exhausted());
        state.current_index_a = state.config.questions_per_team;
        state.current_index_b = state.config.questions_per_team;
        assert!(state.deck_exhausted());
    }
}
