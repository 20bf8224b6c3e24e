//! Room state reducer - the heart of the authoritative game logic.
//!
//! This module implements a pure function that takes a room's state and a command,
//! and returns the new state along with any events that occurred. The command
//! dispatcher is the only caller; it serializes commands per room and hands the
//! result to the State Projector for broadcast.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use super::commands::{HostAction, RoomCommand};
use super::events::RoomEvent;
use super::rules::COUNTDOWN_SECONDS;
use super::scoring::score_for_correct_answer;
use super::state::{PlayerState, RoomPhase, RoomState, RoomStatus, Team};

/// The `spec.md` §7 taxonomy bucket a `RoomError` falls into, carried alongside
/// its code/message so callers outside this crate (the HTTP routes, the
/// WebSocket handler) can pick the right status code / close behavior without
/// pattern-matching on the string `code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Forbidden,
    Conflict,
}

/// Domain errors a command can be rejected with. Distinct from `RoomEvent::Error`
/// (the wire representation) so the dispatcher can match on variant to pick an
/// HTTP status / socket close behavior per `spec.md` §7's taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    Validation(&'static str, String),
    NotFound(&'static str, String),
    Forbidden(&'static str, String),
    Conflict(&'static str, String),
}

impl RoomError {
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::Validation(code, _)
            | RoomError::NotFound(code, _)
            | RoomError::Forbidden(code, _)
            | RoomError::Conflict(code, _) => code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RoomError::Validation(_, m)
            | RoomError::NotFound(_, m)
            | RoomError::Forbidden(_, m)
            | RoomError::Conflict(_, m) => m,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RoomError::Validation(..) => ErrorCategory::Validation,
            RoomError::NotFound(..) => ErrorCategory::NotFound,
            RoomError::Forbidden(..) => ErrorCategory::Forbidden,
            RoomError::Conflict(..) => ErrorCategory::Conflict,
        }
    }
}

impl std::fmt::Display for RoomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for RoomError {}

/// Result of applying a command to the room state.
#[derive(Debug)]
pub struct ReducerResult {
    pub state: RoomState,
    pub events: Vec<RoomEvent>,
    pub changed: bool,
}

impl ReducerResult {
    fn unchanged(state: RoomState) -> Self {
        Self { state, events: vec![], changed: false }
    }

    fn ok(state: RoomState, events: Vec<RoomEvent>) -> Self {
        Self { state, events, changed: true }
    }

    fn rejected(state: RoomState, err: RoomError) -> Self {
        Self { state, events: vec![RoomEvent::error(err.category(), err.code(), err.message())], changed: false }
    }

    pub fn has_error(&self) -> bool {
        self.events.iter().any(|e| e.is_error())
    }

    pub fn get_error(&self) -> Option<&RoomEvent> {
        self.events.iter().find(|e| e.is_error())
    }
}

/// Pure function: apply a command to room state, returning new state + events.
///
/// Deterministic given the same inputs (state, command, timestamp, rng draws),
/// which is why team-shuffle randomness is threaded through an explicit `rng`
/// rather than reached for ambiently — tests fix the seed (`spec.md` §9).
pub fn reduce(state: &RoomState, command: RoomCommand, now: DateTime<Utc>, rng: &mut impl Rng) -> ReducerResult {
    match command {
        RoomCommand::Join { player_id, user_id, name } => handle_join(state.clone(), player_id, user_id, name, now),
        RoomCommand::Start { player_id } => handle_start(state.clone(), player_id, now, rng),
        RoomCommand::Answer { player_id, option_index } => handle_answer(state.clone(), player_id, option_index, now),
        RoomCommand::Vote { player_id, choice } => handle_vote(state.clone(), player_id, choice),
        RoomCommand::Skip { player_id } => handle_skip(state.clone(), player_id, now),
        RoomCommand::TransferCaptain { player_id, to_player_id } => {
            handle_transfer_captain(state.clone(), player_id, to_player_id)
        }
        RoomCommand::HostControl { player_id, action } => handle_host_control(state.clone(), player_id, action, now),
        RoomCommand::Disconnect { player_id } => handle_disconnect(state.clone(), player_id),
        RoomCommand::Timeout { question_id } => handle_timeout(state.clone(), question_id, now),
    }
}

/// Advance the countdown by one tick. Returns `true` while still counting down.
/// Called directly by the room actor between 1-second sleeps — not routed through
/// `reduce` because it is not an externally originated command (`spec.md` §5's
/// "documented cooperative yield point").
pub fn advance_countdown(state: &mut RoomState) -> bool {
    if state.countdown_seconds > 1 {
        state.countdown_seconds -= 1;
        true
    } else {
        state.countdown_seconds = 0;
        false
    }
}

/// Transition `countdown` → `question` for the very first question of a room.
/// Team A always opens (an explicit, documented choice — see `DESIGN.md`).
pub fn begin_first_question(state: &mut RoomState, now: DateTime<Utc>) {
    state.phase = RoomPhase::Question;
    state.current_team = Some(Team::A);
    state.question_started_at = Some(now);
}

// =============================================================================
// Command Handlers
// =============================================================================

fn handle_join(mut state: RoomState, player_id: String, user_id: Option<String>, name: String, now: DateTime<Utc>) -> ReducerResult {
    if state.phase != RoomPhase::Gathering {
        return ReducerResult::rejected(state, RoomError::Conflict("GAME_STARTED", "cannot join a game in progress".into()));
    }

    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 80 {
        return ReducerResult::rejected(state, RoomError::Validation("INVALID_NAME", "name must be 1-80 characters".into()));
    }

    // Canonical dedup rule (spec.md §9): reject by active user_id first, then by name.
    if let Some(uid) = &user_id {
        if state.active_players().any(|p| p.user_id.as_deref() == Some(uid.as_str())) {
            return ReducerResult::rejected(state, RoomError::Conflict("ALREADY_IN_ROOM", "already joined this room".into()));
        }
    }
    if state.active_players().any(|p| p.name == trimmed) {
        return ReducerResult::rejected(state, RoomError::Conflict("NAME_TAKEN", "name already taken in this room".into()));
    }

    state.players.push(PlayerState::new(player_id, user_id, trimmed.to_string(), false, now));
    ReducerResult::ok(state, vec![])
}

fn handle_start(mut state: RoomState, player_id: String, now: DateTime<Utc>, rng: &mut impl Rng) -> ReducerResult {
    if state.player(&player_id).map(|p| p.is_host) != Some(true) {
        return ReducerResult::rejected(state, RoomError::Forbidden("NOT_HOST", "only the host can start the game".into()));
    }
    if state.phase != RoomPhase::Gathering {
        return ReducerResult::rejected(state, RoomError::Conflict("ALREADY_STARTED", "game has already started".into()));
    }

    let mut ordered: Vec<String> = state.active_players().map(|p| p.id.clone()).collect();
    ordered.sort_by_key(|id| state.player(id).map(|p| p.joined_at));
    if ordered.len() < 2 {
        return ReducerResult::rejected(
            state,
            RoomError::Validation("NOT_ENOUGH_PLAYERS", "need at least 2 active players to start".into()),
        );
    }

    let mut shuffled = ordered.clone();
    shuffled.shuffle(rng);

    let mut team_of: std::collections::HashMap<String, Team> = std::collections::HashMap::new();
    for (i, id) in shuffled.iter().enumerate() {
        team_of.insert(id.clone(), if i % 2 == 0 { Team::A } else { Team::B });
    }

    let has_a = team_of.values().any(|t| *t == Team::A);
    let has_b = team_of.values().any(|t| *t == Team::B);
    if !has_a || !has_b {
        return ReducerResult::rejected(state, RoomError::Validation("NEED_BOTH_TEAMS", "need at least one per team".into()));
    }

    for id in &ordered {
        if let Some(player) = state.player_mut(id) {
            player.team = team_of.get(id).copied();
        }
    }

    // Captain = earliest-joined member of each team, by actual joined_at order
    // (not shuffle position — spec.md §4.1).
    for team in [Team::A, Team::B] {
        if let Some(captain_id) = ordered.iter().find(|id| team_of.get(*id) == Some(&team)).cloned() {
            if let Some(player) = state.player_mut(&captain_id) {
                player.is_captain = true;
            }
        }
    }

    state.status = RoomStatus::InProgress;
    state.phase = RoomPhase::Countdown;
    state.countdown_seconds = COUNTDOWN_SECONDS;

    ReducerResult::ok(state, vec![])
}

fn handle_answer(mut state: RoomState, player_id: String, option_index: u8, now: DateTime<Utc>) -> ReducerResult {
    if state.phase != RoomPhase::Question {
        return ReducerResult::rejected(state, RoomError::Forbidden("WRONG_PHASE", "no question is currently open".into()));
    }
    let Some(current_team) = state.current_team else {
        return ReducerResult::rejected(state, RoomError::NotFound("NO_CURRENT_QUESTION", "no current question".into()));
    };

    match authorize_captain(&state, &player_id, current_team) {
        Ok(()) => {}
        Err(err) => return ReducerResult::rejected(state, err),
    }

    if !(1..=4).contains(&option_index) {
        return ReducerResult::rejected(state, RoomError::Validation("INVALID_OPTION", "option_index must be 1..4".into()));
    }

    let Some(question) = state.current_question() else {
        return ReducerResult::rejected(state, RoomError::NotFound("NO_CURRENT_QUESTION", "no current question".into()));
    };
    if question.answered {
        // Single-shot commitment: a second answer for an already-answered question
        // is a silent no-op (spec.md §4.1).
        return ReducerResult::unchanged(state);
    }

    let question_id = question.id.clone();
    let correct_option = question.correct_option;
    let zero_based = option_index - 1;
    let correct = zero_based == correct_option;

    let elapsed = (now - state.question_started_at.unwrap_or(now)).num_seconds();
    let outcome = if correct { Outcome::Correct(score_for_correct_answer(elapsed)) } else { Outcome::Incorrect };

    let event = commit_question(&mut state, current_team, &question_id, outcome, now);
    ReducerResult::ok(state, vec![event])
}

fn handle_vote(mut state: RoomState, player_id: String, choice: String) -> ReducerResult {
    if state.phase != RoomPhase::Question {
        return ReducerResult::rejected(state, RoomError::Forbidden("WRONG_PHASE", "no question is currently open".into()));
    }
    let Some(current_team) = state.current_team else {
        return ReducerResult::rejected(state, RoomError::NotFound("NO_CURRENT_QUESTION", "no current question".into()));
    };
    let Some(player) = state.player(&player_id) else {
        return ReducerResult::rejected(state, RoomError::NotFound("PLAYER_NOT_FOUND", "unknown player".into()));
    };
    if !player.active || player.team != Some(current_team) {
        return ReducerResult::rejected(state, RoomError::Forbidden("WRONG_TEAM", "not on the active team".into()));
    }

    state.votes.insert(player_id, choice);
    ReducerResult::ok(state, vec![])
}

fn handle_skip(mut state: RoomState, player_id: String, now: DateTime<Utc>) -> ReducerResult {
    if state.phase != RoomPhase::Question {
        return ReducerResult::rejected(state, RoomError::Forbidden("WRONG_PHASE", "no question is currently open".into()));
    }
    let Some(current_team) = state.current_team else {
        return ReducerResult::rejected(state, RoomError::NotFound("NO_CURRENT_QUESTION", "no current question".into()));
    };

    match authorize_captain(&state, &player_id, current_team) {
        Ok(()) => {}
        Err(err) => return ReducerResult::rejected(state, err),
    }

    let Some(question) = state.current_question() else {
        return ReducerResult::rejected(state, RoomError::NotFound("NO_CURRENT_QUESTION", "no current question".into()));
    };
    if question.answered {
        return ReducerResult::unchanged(state);
    }
    let question_id = question.id.clone();

    let event = commit_question(&mut state, current_team, &question_id, Outcome::Skip, now);
    ReducerResult::ok(state, vec![event])
}

fn handle_transfer_captain(mut state: RoomState, player_id: String, to_player_id: String) -> ReducerResult {
    if state.status != RoomStatus::InProgress {
        return ReducerResult::rejected(state, RoomError::Conflict("NOT_IN_PROGRESS", "game is not in progress".into()));
    }
    let Some(from) = state.player(&player_id) else {
        return ReducerResult::rejected(state, RoomError::NotFound("PLAYER_NOT_FOUND", "unknown player".into()));
    };
    if !from.is_captain || !from.active {
        return ReducerResult::rejected(state, RoomError::Forbidden("NOT_CAPTAIN", "only the acting captain may transfer".into()));
    }
    let from_team = from.team;

    let Some(to) = state.player(&to_player_id) else {
        return ReducerResult::rejected(state, RoomError::NotFound("PLAYER_NOT_FOUND", "unknown target player".into()));
    };
    if !to.active || to.team != from_team {
        return ReducerResult::rejected(state, RoomError::Forbidden("WRONG_TEAM", "target is not on the same active team".into()));
    }

    if let Some(p) = state.player_mut(&player_id) {
        p.is_captain = false;
    }
    if let Some(p) = state.player_mut(&to_player_id) {
        p.is_captain = true;
    }

    ReducerResult::ok(state, vec![])
}

fn handle_host_control(mut state: RoomState, player_id: String, action: HostAction, now: DateTime<Utc>) -> ReducerResult {
    if state.player(&player_id).map(|p| p.is_host) != Some(true) {
        return ReducerResult::rejected(state, RoomError::Forbidden("NOT_HOST", "only the host may issue this control".into()));
    }

    match action {
        HostAction::Pause => handle_pause(state, now),
        HostAction::Resume => handle_resume(state, now),
        HostAction::NextQuestion => handle_next_question(state, now),
        HostAction::Kick { target_player_id } => handle_kick(state, target_player_id),
        HostAction::Restart { topic, difficulty, deck } => handle_restart(&mut state, topic, difficulty, deck),
    }
}

fn handle_pause(mut state: RoomState, now: DateTime<Utc>) -> ReducerResult {
    if state.phase != RoomPhase::Question {
        return ReducerResult::rejected(state, RoomError::Conflict("WRONG_PHASE", "can only pause during a question".into()));
    }
    let started = state.question_started_at.unwrap_or(now);
    let elapsed = (now - started).num_seconds().max(0) as u32;
    let base = state.config.base_timeout_secs();
    state.paused_elapsed_secs = Some(elapsed);
    state.paused_remaining_secs = Some(base.saturating_sub(elapsed).max(1));
    state.phase = RoomPhase::Paused;
    ReducerResult::ok(state, vec![])
}

fn handle_resume(mut state: RoomState, now: DateTime<Utc>) -> ReducerResult {
    if state.phase != RoomPhase::Paused {
        return ReducerResult::rejected(state, RoomError::Conflict("WRONG_PHASE", "game is not paused".into()));
    }
    let elapsed = state.paused_elapsed_secs.unwrap_or(0) as i64;
    state.question_started_at = Some(now - chrono::Duration::seconds(elapsed));
    state.paused_elapsed_secs = None;
    state.paused_remaining_secs = None;
    state.phase = RoomPhase::Question;
    ReducerResult::ok(state, vec![])
}

fn handle_next_question(mut state: RoomState, now: DateTime<Utc>) -> ReducerResult {
    if state.phase != RoomPhase::Question {
        return ReducerResult::rejected(state, RoomError::Conflict("WRONG_PHASE", "no question is currently open".into()));
    }
    let Some(current_team) = state.current_team else {
        return ReducerResult::rejected(state, RoomError::NotFound("NO_CURRENT_QUESTION", "no current question".into()));
    };
    let Some(question) = state.current_question() else {
        return ReducerResult::rejected(state, RoomError::NotFound("NO_CURRENT_QUESTION", "no current question".into()));
    };
    if question.answered {
        return ReducerResult::unchanged(state);
    }
    let question_id = question.id.clone();

    let event = commit_question(&mut state, current_team, &question_id, Outcome::Skip, now);
    ReducerResult::ok(state, vec![event])
}

fn handle_kick(mut state: RoomState, target_player_id: String) -> ReducerResult {
    let Some(target) = state.player(&target_player_id) else {
        return ReducerResult::rejected(state, RoomError::NotFound("PLAYER_NOT_FOUND", "unknown player".into()));
    };
    let was_captain = target.is_captain;
    let team = target.team;

    if let Some(p) = state.player_mut(&target_player_id) {
        p.active = false;
        p.is_captain = false;
    }

    if was_captain {
        promote_next_captain(&mut state, team);
    }

    ReducerResult::ok(state, vec![])
}

fn handle_restart(state: &mut RoomState, topic: Option<String>, difficulty: Option<super::rules::Difficulty>, deck: Vec<super::state::QuestionState>) -> ReducerResult {
    if state.status != RoomStatus::Finished {
        return ReducerResult::rejected(state.clone(), RoomError::Conflict("NOT_FINISHED", "can only restart a finished game".into()));
    }

    if let Some(topic) = topic {
        state.topic = topic;
    }
    if let Some(difficulty) = difficulty {
        state.config.difficulty = difficulty;
    }
    state.deck = deck;
    state.status = RoomStatus::Waiting;
    state.phase = RoomPhase::Gathering;
    state.current_team = None;
    state.current_index_a = 0;
    state.current_index_b = 0;
    state.score_a = 0;
    state.score_b = 0;
    state.question_started_at = None;
    state.countdown_seconds = 0;
    state.votes.clear();
    state.stats_a = Default::default();
    state.stats_b = Default::default();
    state.paused_elapsed_secs = None;
    state.paused_remaining_secs = None;

    for player in state.players.iter_mut() {
        if !player.is_host {
            player.team = None;
            player.is_captain = false;
        }
    }

    ReducerResult::ok(state.clone(), vec![])
}

fn handle_disconnect(mut state: RoomState, player_id: String) -> ReducerResult {
    let Some(player) = state.player(&player_id) else {
        return ReducerResult::unchanged(state);
    };
    if !player.active {
        return ReducerResult::unchanged(state);
    }
    let was_captain = player.is_captain;
    let team = player.team;

    if let Some(p) = state.player_mut(&player_id) {
        p.active = false;
        p.is_captain = false;
    }

    if was_captain {
        promote_next_captain(&mut state, team);
    }

    ReducerResult::ok(state, vec![])
}

fn handle_timeout(mut state: RoomState, question_id: String, now: DateTime<Utc>) -> ReducerResult {
    if state.phase != RoomPhase::Question {
        return ReducerResult::unchanged(state);
    }
    let Some(current_team) = state.current_team else {
        return ReducerResult::unchanged(state);
    };
    let Some(question) = state.current_question() else {
        return ReducerResult::unchanged(state);
    };
    if question.id != question_id || question.answered {
        return ReducerResult::unchanged(state);
    }

    let event = commit_question(&mut state, current_team, &question_id, Outcome::Timeout, now);
    ReducerResult::ok(state, vec![event])
}

// =============================================================================
// Shared helpers
// =============================================================================

enum Outcome {
    Correct(u32),
    Incorrect,
    Skip,
    Timeout,
}

fn authorize_captain(state: &RoomState, player_id: &str, current_team: Team) -> Result<(), RoomError> {
    let Some(player) = state.player(player_id) else {
        return Err(RoomError::NotFound("PLAYER_NOT_FOUND", "unknown player".into()));
    };
    if !player.active {
        return Err(RoomError::Forbidden("INACTIVE", "player is not active".into()));
    }
    if player.team != Some(current_team) {
        return Err(RoomError::Forbidden("WRONG_TEAM", "not this team's turn".into()));
    }
    if !player.is_captain {
        return Err(RoomError::Forbidden("NOT_CAPTAIN", "only the team captain may answer".into()));
    }
    Ok(())
}

/// Commits the current question: marks it answered, updates score/stats, clears
/// votes, advances the leaving team's index, toggles the active team (or finishes
/// the room if the deck is exhausted), and arms the next question's start time.
fn commit_question(state: &mut RoomState, team: Team, question_id: &str, outcome: Outcome, now: DateTime<Utc>) -> RoomEvent {
    let correct_option = state.question_by_id_mut(question_id).map(|q| q.correct_option).unwrap_or(0);
    if let Some(q) = state.question_by_id_mut(question_id) {
        q.answered = true;
    }

    let (timeout, skip, correct) = match outcome {
        Outcome::Correct(score) => {
            state.add_score(team, score);
            let stats = state.stats_mut(team);
            stats.correct += 1;
            stats.speed_bonus += score.saturating_sub(1);
            (false, false, true)
        }
        Outcome::Incorrect => {
            state.stats_mut(team).incorrect += 1;
            (false, false, false)
        }
        Outcome::Skip => {
            state.stats_mut(team).incorrect += 1;
            (false, true, false)
        }
        Outcome::Timeout => {
            state.stats_mut(team).timeout += 1;
            (true, false, false)
        }
    };

    state.votes.clear();
    state.set_current_index(team, state.current_index(team) + 1);

    if state.deck_exhausted() {
        state.status = RoomStatus::Finished;
        state.phase = RoomPhase::Results;
        state.current_team = None;
        state.question_started_at = None;
    } else {
        state.current_team = Some(team.other());
        state.question_started_at = Some(now);
    }

    RoomEvent::AnswerResult { timeout, skip, correct, correct_option, team, question_id: question_id.to_string() }
}

fn promote_next_captain(state: &mut RoomState, team: Option<Team>) {
    let Some(team) = team else { return };
    let next = state
        .active_team_members(team)
        .min_by_key(|p| p.joined_at)
        .map(|p| p.id.clone());
    if let Some(id) = next {
        if let Some(p) = state.player_mut(&id) {
            p.is_captain = true;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::deck::{build_deck, OracleQuestion};
    use crate::game::rules::{Difficulty, RoomConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    fn sample_deck(questions_per_team: u8) -> Vec<super::super::state::QuestionState> {
        let batch: Vec<OracleQuestion> = (0..(2 * questions_per_team as usize))
            .map(|i| OracleQuestion {
                text: format!("Q{i}"),
                options: ["a".into(), "b".into(), "c".into(), "d".into()],
                correct_option: 1,
            })
            .collect();
        build_deck(batch, questions_per_team, || crate::id::generate_question_id(), &mut rng())
    }

    fn room_with_two_players(questions_per_team: u8) -> RoomState {
        let now = Utc::now();
        let host = PlayerState::new("plr_host".into(), None, "Host".into(), true, now);
        let config = RoomConfig { questions_per_team, difficulty: Difficulty::Medium };
        let mut state = RoomState::new("ABC123".into(), "Geography".into(), config, host, sample_deck(questions_per_team), now);
        state.players.push(PlayerState::new("plr_p".into(), None, "Player".into(), false, now));
        state
    }

    // -------------------------------------------------------------------------
    // Join
    // -------------------------------------------------------------------------

    #[test]
    fn test_join_success() {
        let state = room_with_two_players(5);
        let now = Utc::now();
        let result = reduce(&state, RoomCommand::Join { player_id: "plr_3".into(), user_id: None, name: "Third".into() }, now, &mut rng());
        assert!(result.changed);
        assert_eq!(result.state.players.len(), 3);
    }

    #[test]
    fn test_join_rejects_duplicate_name() {
        let state = room_with_two_players(5);
        let now = Utc::now();
        let result = reduce(&state, RoomCommand::Join { player_id: "plr_3".into(), user_id: None, name: "Host".into() }, now, &mut rng());
        assert!(!result.changed);
        assert_eq!(result.get_error().and_then(|e| if let RoomEvent::Error { code, .. } = e { Some(code.as_str()) } else { None }), Some("NAME_TAKEN"));
    }

    #[test]
    fn test_join_rejects_duplicate_user_id() {
        let mut state = room_with_two_players(5);
        state.players[0].user_id = Some("usr_1".into());
        let now = Utc::now();
        let result = reduce(&state, RoomCommand::Join { player_id: "plr_3".into(), user_id: Some("usr_1".into()), name: "Other".into() }, now, &mut rng());
        assert!(!result.changed);
        assert!(result.has_error());
    }

    #[test]
    fn test_join_rejects_after_start() {
        let mut state = room_with_two_players(5);
        state.phase = RoomPhase::Countdown;
        let now = Utc::now();
        let result = reduce(&state, RoomCommand::Join { player_id: "plr_3".into(), user_id: None, name: "Late".into() }, now, &mut rng());
        assert!(!result.changed);
    }

    // -------------------------------------------------------------------------
    // Start / team assignment (S1)
    // -------------------------------------------------------------------------

    #[test]
    fn test_start_assigns_teams_and_captains() {
        let state = room_with_two_players(5);
        let now = Utc::now();
        let result = reduce(&state, RoomCommand::Start { player_id: "plr_host".into() }, now, &mut rng());
        assert!(result.changed);
        assert_eq!(result.state.phase, RoomPhase::Countdown);
        assert_eq!(result.state.status, RoomStatus::InProgress);
        assert_eq!(result.state.countdown_seconds, COUNTDOWN_SECONDS);

        let a_count = result.state.players.iter().filter(|p| p.team == Some(Team::A)).count();
        let b_count = result.state.players.iter().filter(|p| p.team == Some(Team::B)).count();
        assert_eq!(a_count, 1);
        assert_eq!(b_count, 1);
        assert_eq!(result.state.players.iter().filter(|p| p.is_captain).count(), 2);
    }

    #[test]
    fn test_start_requires_host() {
        let state = room_with_two_players(5);
        let now = Utc::now();
        let result = reduce(&state, RoomCommand::Start { player_id: "plr_p".into() }, now, &mut rng());
        assert!(!result.changed);
        assert_eq!(result.get_error().and_then(|e| if let RoomEvent::Error { code, .. } = e { Some(code.as_str()) } else { None }), Some("NOT_HOST"));
    }

    #[test]
    fn test_start_requires_two_players() {
        let now = Utc::now();
        let host = PlayerState::new("plr_host".into(), None, "Host".into(), true, now);
        let state = RoomState::new("ABC123".into(), "Geography".into(), RoomConfig::default(), host, sample_deck(5), now);
        let result = reduce(&state, RoomCommand::Start { player_id: "plr_host".into() }, now, &mut rng());
        assert!(!result.changed);
        assert!(result.has_error());
    }

    fn started_room(questions_per_team: u8) -> RoomState {
        let state = room_with_two_players(questions_per_team);
        let now = Utc::now();
        let mut state = reduce(&state, RoomCommand::Start { player_id: "plr_host".into() }, now, &mut rng()).state;
        begin_first_question(&mut state, now);
        state
    }

    // -------------------------------------------------------------------------
    // Answer (S1)
    // -------------------------------------------------------------------------

    #[test]
    fn test_correct_answer_awards_speed_bonus_and_toggles_team() {
        let state = started_room(5);
        let captain_a = state.captain_of(Team::A).unwrap().id.clone();
        let question = state.current_question().unwrap().clone();
        let now = state.question_started_at.unwrap() + chrono::Duration::seconds(5);

        let result = reduce(&state, RoomCommand::Answer { player_id: captain_a, option_index: question.correct_option + 1 }, now, &mut rng());
        assert!(result.changed);
        assert_eq!(result.state.score_a, 3);
        assert_eq!(result.state.current_team, Some(Team::B));
        assert_eq!(result.state.current_index_a, 1);
        assert_eq!(result.state.stats_a.correct, 1);
        assert_eq!(result.state.stats_a.speed_bonus, 2);
    }

    #[test]
    fn test_only_captain_may_answer() {
        let state = started_room(5);
        let non_captain = state.active_team_members(Team::A).find(|p| !p.is_captain);
        assert!(non_captain.is_none(), "two-player room has no non-captain teammate");

        // Opposing team's captain cannot answer for team A.
        let captain_b = state.captain_of(Team::B).unwrap().id.clone();
        let now = state.question_started_at.unwrap();
        let result = reduce(&state, RoomCommand::Answer { player_id: captain_b, option_index: 1 }, now, &mut rng());
        assert!(!result.changed);
        assert_eq!(result.get_error().and_then(|e| if let RoomEvent::Error { code, .. } = e { Some(code.as_str()) } else { None }), Some("WRONG_TEAM"));
    }

    #[test]
    fn test_second_answer_is_noop() {
        let state = started_room(5);
        let captain_a = state.captain_of(Team::A).unwrap().id.clone();
        let now = state.question_started_at.unwrap();
        let question_id = state.current_question().unwrap().id.clone();

        let after_first = reduce(&state, RoomCommand::Answer { player_id: captain_a.clone(), option_index: 1 }, now, &mut rng()).state;
        // Re-inject the same command against a state where the question is already answered elsewhere.
        let mut replay = after_first.clone();
        if let Some(q) = replay.question_by_id_mut(&question_id) {
            q.answered = true;
        }
        let result = reduce(&replay, RoomCommand::Timeout { question_id }, now, &mut rng());
        assert!(!result.changed);
        assert!(!result.has_error());
    }

    // -------------------------------------------------------------------------
    // Timeout (S2)
    // -------------------------------------------------------------------------

    #[test]
    fn test_timeout_commits_and_toggles_team() {
        let state = started_room(5);
        let question_id = state.current_question().unwrap().id.clone();
        let now = state.question_started_at.unwrap() + chrono::Duration::seconds(30);

        let result = reduce(&state, RoomCommand::Timeout { question_id }, now, &mut rng());
        assert!(result.changed);
        assert_eq!(result.state.stats_a.timeout, 1);
        assert_eq!(result.state.current_team, Some(Team::B));
        assert_eq!(result.state.score_a, 0);
        match &result.events[0] {
            RoomEvent::AnswerResult { timeout, .. } => assert!(*timeout),
            _ => panic!("expected AnswerResult"),
        }
    }

    #[test]
    fn test_timeout_for_stale_question_is_noop() {
        let state = started_room(5);
        let now = Utc::now();
        let result = reduce(&state, RoomCommand::Timeout { question_id: "qst_nonexistent".into() }, now, &mut rng());
        assert!(!result.changed);
    }

    // -------------------------------------------------------------------------
    // Pause / Resume (S3)
    // -------------------------------------------------------------------------

    #[test]
    fn test_pause_then_resume_preserves_deadline() {
        let state = started_room(5);
        let started = state.question_started_at.unwrap();
        let pause_time = started + chrono::Duration::seconds(22);

        let paused = reduce(&state, RoomCommand::HostControl { player_id: "plr_host".into(), action: HostAction::Pause }, pause_time, &mut rng()).state;
        assert_eq!(paused.phase, RoomPhase::Paused);
        assert_eq!(paused.paused_remaining_secs, Some(8));

        let resume_time = pause_time + chrono::Duration::seconds(120);
        let resumed = reduce(&paused, RoomCommand::HostControl { player_id: "plr_host".into(), action: HostAction::Resume }, resume_time, &mut rng()).state;
        assert_eq!(resumed.phase, RoomPhase::Question);
        let remaining = resumed.config.base_timeout_secs() as i64 - (resume_time - resumed.question_started_at.unwrap()).num_seconds();
        assert_eq!(remaining, 8);
    }

    #[test]
    fn test_pause_requires_question_phase() {
        let state = room_with_two_players(5);
        let now = Utc::now();
        let result = reduce(&state, RoomCommand::HostControl { player_id: "plr_host".into(), action: HostAction::Pause }, now, &mut rng());
        assert!(!result.changed);
    }

    // -------------------------------------------------------------------------
    // Captain disconnect / kick (S4)
    // -------------------------------------------------------------------------

    #[test]
    fn test_disconnect_promotes_next_captain() {
        let state = room_with_two_players(5);
        let now = Utc::now();
        let mut state = reduce(&state, RoomCommand::Start { player_id: "plr_host".into() }, now, &mut rng()).state;
        // Add a third player onto team A before the game would realistically allow
        // it; for this test we directly simulate a 2-member team A.
        state.players.push(PlayerState { id: "plr_3".into(), user_id: None, name: "Third".into(), team: Some(Team::A), is_host: false, is_captain: false, active: true, joined_at: now + chrono::Duration::seconds(1) });

        let captain_a = state.captain_of(Team::A).unwrap().id.clone();
        let result = reduce(&state, RoomCommand::Disconnect { player_id: captain_a.clone() }, now, &mut rng());
        assert!(result.changed);
        assert!(!result.state.player(&captain_a).unwrap().active);
        assert!(result.state.captain_of(Team::A).is_some());
        assert_eq!(result.state.captain_of(Team::A).unwrap().id, "plr_3");
    }

    #[test]
    fn test_disconnect_leaves_team_captainless_when_sole_member_leaves() {
        let state = started_room(5);
        let captain_a = state.captain_of(Team::A).unwrap().id.clone();
        let result = reduce(&state, RoomCommand::Disconnect { player_id: captain_a }, Utc::now(), &mut rng());
        assert!(result.changed);
        assert!(result.state.captain_of(Team::A).is_none());
    }

    #[test]
    fn test_kick_inactive_unknown_player_errors() {
        let state = room_with_two_players(5);
        let result = reduce(&state, RoomCommand::HostControl { player_id: "plr_host".into(), action: HostAction::Kick { target_player_id: "plr_ghost".into() } }, Utc::now(), &mut rng());
        assert!(!result.changed);
        assert!(result.has_error());
    }

    // -------------------------------------------------------------------------
    // Vote percentages (S6)
    // -------------------------------------------------------------------------

    #[test]
    fn test_vote_updates_state() {
        let state = started_room(5);
        let captain_a = state.captain_of(Team::A).unwrap().id.clone();
        let result = reduce(&state, RoomCommand::Vote { player_id: captain_a.clone(), choice: "opt1".into() }, Utc::now(), &mut rng());
        assert!(result.changed);
        assert_eq!(result.state.votes.get(&captain_a), Some(&"opt1".to_string()));
    }

    #[test]
    fn test_vote_cleared_on_commitment() {
        let state = started_room(5);
        let captain_a = state.captain_of(Team::A).unwrap().id.clone();
        let mut state = reduce(&state, RoomCommand::Vote { player_id: captain_a.clone(), choice: "opt1".into() }, Utc::now(), &mut rng()).state;
        let question_id = state.current_question().unwrap().id.clone();
        state = reduce(&state, RoomCommand::Timeout { question_id }, state.question_started_at.unwrap() + chrono::Duration::seconds(30), &mut rng()).state;
        assert!(state.votes.is_empty());
    }

    // -------------------------------------------------------------------------
    // Restart (S5)
    // -------------------------------------------------------------------------

    #[test]
    fn test_restart_requires_finished_status() {
        let state = room_with_two_players(5);
        let result = reduce(&state, RoomCommand::HostControl { player_id: "plr_host".into(), action: HostAction::Restart { topic: None, difficulty: None, deck: vec![] } }, Utc::now(), &mut rng());
        assert!(!result.changed);
    }

    #[test]
    fn test_restart_resets_teams_and_scores() {
        let mut state = started_room(1);
        state.status = RoomStatus::Finished;
        state.phase = RoomPhase::Results;
        state.score_a = 3;
        let new_deck = sample_deck(5);

        let result = reduce(
            &state,
            RoomCommand::HostControl {
                player_id: "plr_host".into(),
                action: HostAction::Restart { topic: Some("Physics".into()), difficulty: Some(Difficulty::Hard), deck: new_deck },
            },
            Utc::now(),
            &mut rng(),
        );
        assert!(result.changed);
        assert_eq!(result.state.status, RoomStatus::Waiting);
        assert_eq!(result.state.phase, RoomPhase::Gathering);
        assert_eq!(result.state.topic, "Physics");
        assert_eq!(result.state.config.difficulty, Difficulty::Hard);
        assert_eq!(result.state.score_a, 0);
        assert_eq!(result.state.deck.len(), 10);
        assert!(result.state.players.iter().find(|p| !p.is_host).unwrap().team.is_none());
    }

    // -------------------------------------------------------------------------
    // Full game to finish
    // -------------------------------------------------------------------------

    #[test]
    fn test_room_finishes_when_deck_exhausted() {
        let mut state = started_room(1);
        loop {
            if state.status == RoomStatus::Finished {
                break;
            }
            let question_id = state.current_question().unwrap().id.clone();
            let now = state.question_started_at.unwrap() + chrono::Duration::seconds(30);
            state = reduce(&state, RoomCommand::Timeout { question_id }, now, &mut rng()).state;
        }
        assert_eq!(state.status, RoomStatus::Finished);
        assert_eq!(state.phase, RoomPhase::Results);
        assert_eq!(state.current_index_a, 1);
        assert_eq!(state.current_index_b, 1);
        assert!(state.current_team.is_none());
    }
}
