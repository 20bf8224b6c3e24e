//! Bridges the durable `games`/`players`/`questions` rows to the engine's
//! in-memory [`quizbattle_core::game::RoomState`].
//!
//! Two processes need this mapping: `quizbattle-api`'s HTTP routes apply
//! `join`/`start` against a room with no live actor yet, and
//! `quizbattle-realtime` hydrates a fresh [`quizbattle_core::game::RoomState`]
//! the first time a socket connects to a PIN. Both reconstruct state the same
//! way so the reducer's rules apply identically regardless of which process
//! issued the command (`spec.md` §9).

use quizbattle_core::game::{PlayerState, QuestionState, RoomConfig, RoomState};

use crate::games::{Game, GameDifficulty, GamePhase, GameStatus, Player, TeamColumn};
use crate::questions::{NewQuestion, QuestionRow};
use crate::DbPool;

fn difficulty_from_row(d: GameDifficulty) -> quizbattle_core::game::Difficulty {
    use quizbattle_core::game::Difficulty;
    match d {
        GameDifficulty::Easy => Difficulty::Easy,
        GameDifficulty::Medium => Difficulty::Medium,
        GameDifficulty::Hard => Difficulty::Hard,
    }
}

fn difficulty_to_row(d: quizbattle_core::game::Difficulty) -> GameDifficulty {
    use quizbattle_core::game::Difficulty;
    match d {
        Difficulty::Easy => GameDifficulty::Easy,
        Difficulty::Medium => GameDifficulty::Medium,
        Difficulty::Hard => GameDifficulty::Hard,
    }
}

fn team_from_row(t: TeamColumn) -> quizbattle_core::game::Team {
    use quizbattle_core::game::Team;
    match t {
        TeamColumn::A => Team::A,
        TeamColumn::B => Team::B,
    }
}

fn team_to_row(t: quizbattle_core::game::Team) -> TeamColumn {
    use quizbattle_core::game::Team;
    match t {
        Team::A => TeamColumn::A,
        Team::B => TeamColumn::B,
    }
}

fn status_from_row(s: GameStatus) -> quizbattle_core::game::RoomStatus {
    use quizbattle_core::game::RoomStatus;
    match s {
        GameStatus::Waiting => RoomStatus::Waiting,
        GameStatus::InProgress => RoomStatus::InProgress,
        GameStatus::Finished => RoomStatus::Finished,
    }
}

fn status_to_row(s: quizbattle_core::game::RoomStatus) -> GameStatus {
    use quizbattle_core::game::RoomStatus;
    match s {
        RoomStatus::Waiting => GameStatus::Waiting,
        RoomStatus::InProgress => GameStatus::InProgress,
        RoomStatus::Finished => GameStatus::Finished,
    }
}

fn phase_from_row(p: GamePhase) -> quizbattle_core::game::RoomPhase {
    use quizbattle_core::game::RoomPhase;
    match p {
        GamePhase::Gathering => RoomPhase::Gathering,
        GamePhase::Countdown => RoomPhase::Countdown,
        GamePhase::Question => RoomPhase::Question,
        GamePhase::Paused => RoomPhase::Paused,
        GamePhase::Results => RoomPhase::Results,
    }
}

fn phase_to_row(p: quizbattle_core::game::RoomPhase) -> GamePhase {
    use quizbattle_core::game::RoomPhase;
    match p {
        RoomPhase::Gathering => GamePhase::Gathering,
        RoomPhase::Countdown => GamePhase::Countdown,
        RoomPhase::Question => GamePhase::Question,
        RoomPhase::Paused => GamePhase::Paused,
        RoomPhase::Results => GamePhase::Results,
    }
}

fn player_from_row(row: &Player) -> PlayerState {
    let mut player =
        PlayerState::new(row.id.clone(), row.user_id.clone(), row.name.clone(), row.is_host, row.joined_at);
    player.team = row.team.map(team_from_row);
    player.is_captain = row.is_captain;
    player.active = row.active;
    player
}

fn question_from_row(row: &QuestionRow) -> QuestionState {
    QuestionState {
        id: row.id.clone(),
        team: team_from_row(row.team),
        order_index: row.order_index as u8,
        text: row.text.clone(),
        options: row.options(),
        correct_option: row.correct_option as u8,
        answered: row.answered,
    }
}

/// Map a freshly built in-memory deck to the rows `questions::insert_deck` expects,
/// shared by room creation and by a `restart` host action replacing the deck.
pub fn deck_to_rows(deck: &[QuestionState]) -> Vec<NewQuestion> {
    deck.iter()
        .map(|q| NewQuestion {
            id: q.id.clone(),
            team: team_to_row(q.team),
            order_index: q.order_index as i16,
            text: q.text.clone(),
            options: q.options.clone(),
            correct_option: q.correct_option as i16,
        })
        .collect()
}

/// Reconstruct a room's full in-memory state from its durable rows.
///
/// Transient fields with no persisted counterpart (`votes`, per-question pause
/// timing, team stats, countdown) start from their rest value — correct for
/// both call sites: a fresh HTTP `join`/`start` never needs them, and a room's
/// live actor never restarts mid-question (`spec.md` §9).
pub async fn hydrate_room_state(pool: &DbPool, game: &Game) -> Result<RoomState, sqlx::Error> {
    let players = crate::games::list_players(pool, &game.id).await?;
    let deck = crate::questions::get_by_room(pool, &game.id).await?;

    let host = players
        .iter()
        .find(|p| p.is_host)
        .map(player_from_row)
        .unwrap_or_else(|| PlayerState::new(quizbattle_core::generate_player_id(), None, "Host".into(), true, game.created_at));

    let mut state = RoomState::new(
        game.pin.clone(),
        game.topic.clone(),
        RoomConfig { questions_per_team: game.questions_per_team as u8, difficulty: difficulty_from_row(game.difficulty) },
        host,
        deck.iter().map(question_from_row).collect(),
        game.created_at,
    );

    state.players = players.iter().map(player_from_row).collect();
    state.status = status_from_row(game.status);
    state.phase = phase_from_row(game.phase);
    state.current_team = game.current_team.map(team_from_row);
    state.current_index_a = game.current_index_a as u8;
    state.current_index_b = game.current_index_b as u8;
    state.score_a = game.score_a as u32;
    state.score_b = game.score_b as u32;
    state.question_started_at = game.question_started_at;

    Ok(state)
}

/// Persist the derived room fields, every player's team/captain/active flag,
/// and every deck question's `answered` flag, in one transaction.
pub async fn persist_room_state(pool: &DbPool, game_id: &str, state: &RoomState) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query!(
        r#"
        UPDATE games
        SET status = $2, phase = $3,
            current_team = $4, current_index_a = $5,
            current_index_b = $6, score_a = $7, score_b = $8, question_started_at = $9,
            topic = $10, difficulty = $11
        WHERE id = $1
        "#,
        game_id,
        status_to_row(state.status) as GameStatus,
        phase_to_row(state.phase) as GamePhase,
        state.current_team.map(team_to_row) as Option<TeamColumn>,
        state.current_index_a as i16,
        state.current_index_b as i16,
        state.score_a as i32,
        state.score_b as i32,
        state.question_started_at,
        state.topic,
        difficulty_to_row(state.config.difficulty) as GameDifficulty,
    )
    .execute(&mut *tx)
    .await?;

    for player in &state.players {
        sqlx::query!(
            r#"UPDATE players SET team = $2, is_captain = $3, active = $4 WHERE id = $1"#,
            player.id,
            player.team.map(team_to_row) as Option<TeamColumn>,
            player.is_captain,
            player.active,
        )
        .execute(&mut *tx)
        .await?;
    }

    for question in state.deck.iter().filter(|q| q.answered) {
        sqlx::query!("UPDATE questions SET answered = TRUE WHERE id = $1", question.id).execute(&mut *tx).await?;
    }

    tx.commit().await
}
