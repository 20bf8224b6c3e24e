//! User API DTOs (`spec.md` §6: `GET /users/{id}/stats`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Profile statistics returned by `GET /users/{id}/stats`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserStats {
    #[schema(example = "usr_V1StGXR8_Z5j")]
    pub id: String,
    #[schema(example = "CoolPlayer42")]
    pub username: String,
    pub games_played: i32,
    pub total_score: i64,
    pub best_score: i32,
    pub wins: i32,
    pub created_at: DateTime<Utc>,
}
