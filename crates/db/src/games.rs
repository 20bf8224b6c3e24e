//! Room (`games` table) and player (`players` table) database queries.
//!
//! The live room actor in `quizbattle-realtime` is authoritative while a room is
//! active; these functions persist a durable record and let a freshly booted
//! process reconstruct a room up to its last question boundary.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "game_status", rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "game_phase", rename_all = "snake_case")]
pub enum GamePhase {
    Gathering,
    Countdown,
    Question,
    Paused,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "game_difficulty", rename_all = "lowercase")]
pub enum GameDifficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "team", rename_all = "UPPERCASE")]
pub enum TeamColumn {
    A,
    B,
}

#[derive(Debug, Clone, FromRow)]
pub struct Game {
    pub id: String, // gam_XXXXXXXXXXXX
    pub pin: String,
    pub topic: String,
    pub difficulty: GameDifficulty,
    pub questions_per_team: i16,
    pub status: GameStatus,
    pub phase: GamePhase,
    pub current_team: Option<TeamColumn>,
    pub current_index_a: i16,
    pub current_index_b: i16,
    pub score_a: i32,
    pub score_b: i32,
    pub question_started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Player {
    pub id: String, // plr_XXXXXXXXXXXX
    pub game_id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub team: Option<TeamColumn>,
    pub is_host: bool,
    pub is_captain: bool,
    pub active: bool,
    pub joined_at: DateTime<Utc>,
    /// Bearer credential presented back to open this player's `/ws/{pin}/{player_id}` socket.
    pub token: String,
}

/// Create a new room in `waiting`/`gathering`.
pub async fn create_game(
    pool: &DbPool,
    pin: &str,
    topic: &str,
    difficulty: GameDifficulty,
    questions_per_team: i16,
) -> Result<Game, sqlx::Error> {
    let id = quizbattle_core::generate_game_id();

    sqlx::query_as!(
        Game,
        r#"
        INSERT INTO games (id, pin, topic, difficulty, questions_per_team, status, phase)
        VALUES ($1, $2, $3, $4, $5, 'waiting', 'gathering')
        RETURNING id, pin, topic, difficulty as "difficulty: GameDifficulty",
                  questions_per_team, status as "status: GameStatus", phase as "phase: GamePhase",
                  current_team as "current_team: TeamColumn", current_index_a, current_index_b,
                  score_a, score_b, question_started_at, created_at
        "#,
        id,
        pin,
        topic,
        difficulty as GameDifficulty,
        questions_per_team
    )
    .fetch_one(pool)
    .await
}

/// Look up a room by its (already-uppercased) PIN among non-finished rooms, the
/// only scope in which a PIN is guaranteed unique (`spec.md` §3 invariant 1).
pub async fn get_live_by_pin(pool: &DbPool, pin: &str) -> Result<Option<Game>, sqlx::Error> {
    sqlx::query_as!(
        Game,
        r#"
        SELECT id, pin, topic, difficulty as "difficulty: GameDifficulty",
               questions_per_team, status as "status: GameStatus", phase as "phase: GamePhase",
               current_team as "current_team: TeamColumn", current_index_a, current_index_b,
               score_a, score_b, question_started_at, created_at
        FROM games WHERE pin = $1 AND status != 'finished'
        "#,
        pin
    )
    .fetch_optional(pool)
    .await
}

pub async fn get_by_id(pool: &DbPool, id: &str) -> Result<Option<Game>, sqlx::Error> {
    sqlx::query_as!(
        Game,
        r#"
        SELECT id, pin, topic, difficulty as "difficulty: GameDifficulty",
               questions_per_team, status as "status: GameStatus", phase as "phase: GamePhase",
               current_team as "current_team: TeamColumn", current_index_a, current_index_b,
               score_a, score_b, question_started_at, created_at
        FROM games WHERE id = $1
        "#,
        id
    )
    .fetch_optional(pool)
    .await
}

// =============================================================================
// Player operations
// =============================================================================

/// Insert a player row under a caller-supplied id. The id is generated by the
/// caller (not here) so an HTTP join handler can apply `RoomCommand::Join`
/// through the room actor first and only persist once the actor accepts it,
/// using the same id for both.
pub async fn add_player(
    pool: &DbPool,
    id: &str,
    game_id: &str,
    user_id: Option<&str>,
    name: &str,
    is_host: bool,
    token: &str,
) -> Result<Player, sqlx::Error> {
    sqlx::query_as!(
        Player,
        r#"
        INSERT INTO players (id, game_id, user_id, name, is_host, token)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, game_id, user_id, name, team as "team: TeamColumn", is_host, is_captain, active, joined_at, token
        "#,
        id,
        game_id,
        user_id,
        name,
        is_host,
        token
    )
    .fetch_one(pool)
    .await
}

pub async fn list_players(pool: &DbPool, game_id: &str) -> Result<Vec<Player>, sqlx::Error> {
    sqlx::query_as!(
        Player,
        r#"
        SELECT id, game_id, user_id, name, team as "team: TeamColumn", is_host, is_captain, active, joined_at, token
        FROM players WHERE game_id = $1 ORDER BY joined_at ASC
        "#,
        game_id
    )
    .fetch_all(pool)
    .await
}

pub async fn get_player_by_id(pool: &DbPool, player_id: &str) -> Result<Option<Player>, sqlx::Error> {
    sqlx::query_as!(
        Player,
        r#"
        SELECT id, game_id, user_id, name, team as "team: TeamColumn", is_host, is_captain, active, joined_at, token
        FROM players WHERE id = $1
        "#,
        player_id
    )
    .fetch_optional(pool)
    .await
}
