//! Authentication API DTOs (`spec.md` §6: `/auth/register`, `/auth/login`, `/auth/logout`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 32))]
    #[schema(example = "CoolPlayer42")]
    pub username: String,
    #[validate(length(min = 8, max = 72))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    #[schema(example = "usr_V1StGXR8_Z5j")]
    pub user_id: String,
    pub username: String,
}
