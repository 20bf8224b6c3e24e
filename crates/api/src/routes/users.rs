//! User routes: `GET /users/{id}/stats` (`spec.md` §6).

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use quizbattle_protocol::api::user::UserStats;

use crate::{error::ApiError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/stats", get(get_stats))
}

#[utoipa::path(
    get,
    path = "/users/{id}/stats",
    params(("id" = String, Path, description = "User ID (e.g., usr_V1StGXR8_Z5j)")),
    responses(
        (status = 200, description = "User stats", body = UserStats),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
async fn get_stats(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<UserStats>, ApiError> {
    let user = quizbattle_db::users::get_by_id(state.db(), &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user".to_string()))?;

    Ok(Json(UserStats {
        id: user.id,
        username: user.username,
        games_played: user.games_played,
        total_score: user.total_score,
        best_score: user.best_score,
        wins: user.wins,
        created_at: user.created_at,
    }))
}
