//! Rating routes: `GET /rating/data` (`spec.md` §6).

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use quizbattle_protocol::api::rating::{RatingResponse, RatingRow};

use crate::{error::ApiError, state::AppState};

const RATING_LIMIT: i64 = 100;

pub fn router() -> Router<AppState> {
    Router::new().route("/data", get(get_rating))
}

#[utoipa::path(
    get,
    path = "/rating/data",
    responses((status = 200, description = "All-time win ranking", body = RatingResponse)),
    tag = "rating"
)]
async fn get_rating(State(state): State<AppState>) -> Result<Json<RatingResponse>, ApiError> {
    let rows = quizbattle_db::ratings::get_rating(state.db(), RATING_LIMIT)
        .await?
        .into_iter()
        .map(|r| RatingRow { user_id: r.user_id, username: r.username, wins: r.wins, games_finished: r.games_finished })
        .collect();

    Ok(Json(RatingResponse { rows }))
}
