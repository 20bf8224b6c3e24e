//! Rating API DTOs (`spec.md` §6: `GET /rating/data`).

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RatingRow {
    pub user_id: String,
    pub username: String,
    pub wins: i32,
    pub games_finished: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RatingResponse {
    pub rows: Vec<RatingRow>,
}
