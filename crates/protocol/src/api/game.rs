//! Room API DTOs (`spec.md` §6: `/games`, `/games/{pin}/join`, `/games/{pin}/start`, `GET /games/{pin}`).
//!
//! `state` carries the engine's room snapshot, serialized by the caller; this
//! crate stays independent of the engine's own types (see `quizbattle-core`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GameDifficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateGameRequest {
    #[validate(length(min = 1, max = 50))]
    pub host_name: String,
    #[validate(length(min = 2, max = 255))]
    pub topic: String,
    #[validate(range(min = 5, max = 7))]
    pub questions_per_team: u8,
    pub difficulty: Option<GameDifficulty>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateGameResponse {
    pub pin: String,
    pub host_player_id: String,
    pub player_token: String,
    #[schema(value_type = Object)]
    pub state: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct JoinGameRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JoinGameResponse {
    pub player_id: String,
    pub player_token: String,
    #[schema(value_type = Object)]
    pub state: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StartGameRequest {
    pub host_player_id: String,
}
