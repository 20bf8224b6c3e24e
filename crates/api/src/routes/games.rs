//! Room routes: `/games`, `/games/{pin}/join`, `/games/{pin}/start`, `GET /games/{pin}`
//! (`spec.md` §6). Each request that changes room state is routed through the
//! same room actor a WebSocket connection would use, so the reducer's rules
//! apply uniformly no matter which process issued the command (`spec.md` §9).

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sqlx::error::DatabaseError;
use validator::Validate;

use quizbattle_auth::middleware::MaybeAuthUser;
use quizbattle_core::game::deck::{build_deck, OracleQuestion};
use quizbattle_core::game::{project, Difficulty, PlayerState, RoomCommand, RoomConfig, RoomState};
use quizbattle_db::games::{Game, GameDifficulty};
use quizbattle_protocol::api::game::{
    CreateGameRequest, CreateGameResponse, GameDifficulty as WireDifficulty, JoinGameRequest, JoinGameResponse,
    StartGameRequest,
};
use quizbattle_realtime::actors::{dispatch, Inbound, Outcome};

use crate::{error::ApiError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_game))
        .route("/{pin}/join", post(join_game))
        .route("/{pin}/start", post(start_game))
        .route("/{pin}", get(get_game))
}

fn wire_to_core_difficulty(d: WireDifficulty) -> Difficulty {
    match d {
        WireDifficulty::Easy => Difficulty::Easy,
        WireDifficulty::Medium => Difficulty::Medium,
        WireDifficulty::Hard => Difficulty::Hard,
    }
}

fn core_to_row_difficulty(d: Difficulty) -> GameDifficulty {
    match d {
        Difficulty::Easy => GameDifficulty::Easy,
        Difficulty::Medium => GameDifficulty::Medium,
        Difficulty::Hard => GameDifficulty::Hard,
    }
}

/// Maximum attempts at generating a unique PIN before giving up (`spec.md` §3
/// invariant 1: PINs are unique only among non-finished rooms, so collisions
/// are rare but not impossible).
const MAX_PIN_ATTEMPTS: u8 = 5;

async fn insert_game_row(
    pool: &quizbattle_db::DbPool,
    topic: &str,
    difficulty: GameDifficulty,
    questions_per_team: i16,
) -> Result<Game, ApiError> {
    for attempt in 0..MAX_PIN_ATTEMPTS {
        let pin = quizbattle_core::generate_pin();
        match quizbattle_db::games::create_game(pool, &pin, topic, difficulty, questions_per_team).await {
            Ok(game) => return Ok(game),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::debug!(attempt, pin = %pin, "PIN collision, retrying");
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(ApiError::Internal(anyhow::anyhow!("could not allocate a unique room PIN after {MAX_PIN_ATTEMPTS} attempts")))
}

#[utoipa::path(
    post,
    path = "/games",
    request_body = CreateGameRequest,
    responses((status = 200, description = "Room created", body = CreateGameResponse)),
    tag = "games"
)]
async fn create_game(
    State(state): State<AppState>,
    MaybeAuthUser(auth): MaybeAuthUser,
    Json(body): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, ApiError> {
    body.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // A session cookie is authoritative over whatever `user_id` the client claims in
    // the body; anonymous hosts still pass through via `body.user_id` untouched.
    let user_id = auth.map(|u| u.user_id).or(body.user_id.clone());

    let difficulty = body.difficulty.map(wire_to_core_difficulty).unwrap_or(Difficulty::Medium);
    let config = RoomConfig { questions_per_team: body.questions_per_team, difficulty };

    let mut rng = ChaCha20Rng::from_entropy();
    let count = 2 * config.questions_per_team as usize;
    let batch = quizbattle_oracle::fetch(Some(state.realtime.oracle.as_ref()), &body.topic, &difficulty.to_string(), count, &mut rng)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    let oracle_questions: Vec<OracleQuestion> =
        batch.into_iter().map(|q| OracleQuestion { text: q.text, options: q.options, correct_option: q.correct_option }).collect();
    let deck = build_deck(oracle_questions, config.questions_per_team, quizbattle_core::generate_question_id, &mut rng);

    let game = insert_game_row(state.db(), &body.topic, core_to_row_difficulty(difficulty), config.questions_per_team as i16).await?;

    let rows: Vec<quizbattle_db::questions::NewQuestion> = deck
        .iter()
        .map(|q| quizbattle_db::questions::NewQuestion {
            id: q.id.clone(),
            team: match q.team {
                quizbattle_core::game::Team::A => quizbattle_db::games::TeamColumn::A,
                quizbattle_core::game::Team::B => quizbattle_db::games::TeamColumn::B,
            },
            order_index: q.order_index as i16,
            text: q.text.clone(),
            options: q.options.clone(),
            correct_option: q.correct_option as i16,
        })
        .collect();
    quizbattle_db::questions::insert_deck(state.db(), &game.id, &rows).await?;

    let host_player_id = quizbattle_core::generate_player_id();
    let player_token = quizbattle_core::session::generate_session_token();
    quizbattle_db::games::add_player(state.db(), &host_player_id, &game.id, user_id.as_deref(), &body.host_name, true, &player_token)
        .await?;

    let now = chrono::Utc::now();
    let host = PlayerState::new(host_player_id.clone(), user_id.clone(), body.host_name.clone(), true, now);
    let room_state = RoomState::new(game.pin.clone(), body.topic.clone(), config, host, deck, now);

    state.realtime.spawn_new_room(game.id.clone(), game.pin.clone(), room_state.clone()).await;

    let snapshot = project(&room_state, now);
    Ok(Json(CreateGameResponse {
        pin: game.pin,
        host_player_id,
        player_token,
        state: serde_json::to_value(snapshot).expect("snapshot serializes"),
    }))
}

#[utoipa::path(
    post,
    path = "/games/{pin}/join",
    params(("pin" = String, Path, description = "Room PIN")),
    request_body = JoinGameRequest,
    responses(
        (status = 200, description = "Joined", body = JoinGameResponse),
        (status = 404, description = "Room not found"),
    ),
    tag = "games"
)]
async fn join_game(
    State(state): State<AppState>,
    MaybeAuthUser(auth): MaybeAuthUser,
    Path(pin): Path<String>,
    Json(body): Json<JoinGameRequest>,
) -> Result<Json<JoinGameResponse>, ApiError> {
    body.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let pin = quizbattle_core::id::normalize_pin(&pin);

    let user_id = auth.map(|u| u.user_id).or(body.user_id.clone());

    let handle = state
        .realtime
        .get_or_spawn_room(&pin)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("room".to_string()))?;

    let player_id = quizbattle_core::generate_player_id();
    let command = RoomCommand::Join { player_id: player_id.clone(), user_id: user_id.clone(), name: body.name.clone() };

    let snapshot = match dispatch(&handle.tx, Inbound::Command(command)).await {
        Outcome::Applied { snapshot } => snapshot,
        Outcome::Rejected { category, code, message } => {
            return Err(ApiError::from_room_rejection(category, &code, &message))
        }
    };

    let game = quizbattle_db::games::get_live_by_pin(state.db(), &pin)
        .await?
        .ok_or_else(|| ApiError::NotFound("room".to_string()))?;

    let player_token = quizbattle_core::session::generate_session_token();
    quizbattle_db::games::add_player(state.db(), &player_id, &game.id, user_id.as_deref(), &body.name, false, &player_token)
        .await?;

    Ok(Json(JoinGameResponse { player_id, player_token, state: snapshot }))
}

#[utoipa::path(
    post,
    path = "/games/{pin}/start",
    params(("pin" = String, Path, description = "Room PIN")),
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Room started"),
        (status = 404, description = "Room not found"),
    ),
    tag = "games"
)]
async fn start_game(
    State(state): State<AppState>,
    Path(pin): Path<String>,
    Json(body): Json<StartGameRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pin = quizbattle_core::id::normalize_pin(&pin);

    let handle = state
        .realtime
        .get_or_spawn_room(&pin)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("room".to_string()))?;

    let command = RoomCommand::Start { player_id: body.host_player_id };
    match dispatch(&handle.tx, Inbound::Command(command)).await {
        Outcome::Applied { snapshot } => Ok(Json(snapshot)),
        Outcome::Rejected { category, code, message } => Err(ApiError::from_room_rejection(category, &code, &message)),
    }
}

#[utoipa::path(
    get,
    path = "/games/{pin}",
    params(("pin" = String, Path, description = "Room PIN")),
    responses(
        (status = 200, description = "Current room state"),
        (status = 404, description = "Room not found"),
    ),
    tag = "games"
)]
async fn get_game(State(state): State<AppState>, Path(pin): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    let pin = quizbattle_core::id::normalize_pin(&pin);

    let handle = state
        .realtime
        .get_or_spawn_room(&pin)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::NotFound("room".to_string()))?;

    match dispatch(&handle.tx, Inbound::Query).await {
        Outcome::Applied { snapshot } => Ok(Json(snapshot)),
        Outcome::Rejected { category, code, message } => Err(ApiError::from_room_rejection(category, &code, &message)),
    }
}
