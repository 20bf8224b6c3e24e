//! API routes

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::middleware::security_headers::security_headers;
use crate::state::AppState;

pub mod auth;
pub mod games;
pub mod health;
pub mod rating;
pub mod users;

/// OpenAPI documentation for the HTTP control surface (`spec.md` §6). The
/// WebSocket protocol it hands off to lives outside this document —
/// `quizbattle-protocol`'s `socket` module is the source of truth for that.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        games::create_game,
        games::join_game,
        games::start_game,
        games::get_game,
        users::get_stats,
        rating::get_rating,
    ),
    components(schemas(
        quizbattle_protocol::api::auth::RegisterRequest,
        quizbattle_protocol::api::auth::LoginRequest,
        quizbattle_protocol::api::auth::AuthResponse,
        quizbattle_protocol::api::game::CreateGameRequest,
        quizbattle_protocol::api::game::CreateGameResponse,
        quizbattle_protocol::api::game::JoinGameRequest,
        quizbattle_protocol::api::game::JoinGameResponse,
        quizbattle_protocol::api::game::StartGameRequest,
        quizbattle_protocol::api::game::GameDifficulty,
        quizbattle_protocol::api::user::UserStats,
        quizbattle_protocol::api::rating::RatingRow,
        quizbattle_protocol::api::rating::RatingResponse,
        health::HealthResponse,
    )),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "auth", description = "Registration, login, logout"),
        (name = "games", description = "Room lifecycle: create, join, start, query state"),
        (name = "users", description = "Profile statistics"),
        (name = "rating", description = "All-time win ranking"),
    ),
    info(
        title = "QuizBattle API",
        version = "1.0.0",
        description = "Real-time multiplayer quiz room engine"
    )
)]
pub struct ApiDoc;

/// Build the HTTP router (`spec.md` §6's control surface). The caller merges
/// the realtime crate's WebSocket router alongside this once both are bound
/// to their respective state.
pub fn create_router(state: AppState, cors: CorsLayer) -> Router<()> {
    let app = Router::new()
        .route("/health", axum::routing::get(health::health_check))
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/games", games::router())
        .nest("/rating", rating::router())
        .layer(axum::middleware::from_fn_with_state(state.clone(), crate::middleware::rate_limit))
        .layer(axum::middleware::from_fn(security_headers))
        .with_state(state);

    let scalar = Scalar::with_url("/docs", ApiDoc::openapi());

    app.merge(scalar).layer(TraceLayer::new_for_http()).layer(cors)
}
