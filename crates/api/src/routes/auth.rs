//! Authentication routes: `/auth/register`, `/auth/login`, `/auth/logout` (`spec.md` §6).

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use quizbattle_auth::middleware::AuthUser;
use quizbattle_auth::session::{build_cookie_header, build_delete_cookie_header};
use quizbattle_auth::{service, service::AuthError};
use quizbattle_protocol::api::auth::{AuthResponse, LoginRequest, RegisterRequest};
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::client_ip::{extract_ip_from_headers, ClientIpConfig};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UsernameTaken => ApiError::BadRequest("username already taken".to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized,
            AuthError::Database(e) => ApiError::Internal(e.into()),
            AuthError::Hash(e) => ApiError::Internal(anyhow::anyhow!(e)),
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses((status = 200, description = "Registered", body = AuthResponse)),
    tag = "auth"
)]
async fn register(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    body.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let ip_config = ClientIpConfig::from_config(&state.config);
    let ip = extract_ip_from_headers(&headers, &ip_config);

    let result = service::register(state.db(), &body.username, &body.password, &state.session_config, ip.as_deref(), None)
        .await?;

    Ok(with_session_cookie(&state, &result.session_id, AuthResponse { user_id: result.user_id, username: result.username }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses((status = 200, description = "Logged in", body = AuthResponse)),
    tag = "auth"
)]
async fn login(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    body.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let ip_config = ClientIpConfig::from_config(&state.config);
    let ip = extract_ip_from_headers(&headers, &ip_config);

    let result = service::login(state.db(), &body.username, &body.password, &state.session_config, ip.as_deref(), None).await?;

    Ok(with_session_cookie(&state, &result.session_id, AuthResponse { user_id: result.user_id, username: result.username }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Logged out")),
    tag = "auth"
)]
async fn logout(State(state): State<AppState>, user: AuthUser) -> Result<Response, ApiError> {
    service::logout(state.db(), &user.session_id).await?;

    let mut response = Json(serde_json::json!({ "ok": true })).into_response();
    response
        .headers_mut()
        .insert(SET_COOKIE, build_delete_cookie_header(&state.session_config).parse().expect("valid cookie header"));
    Ok(response)
}

fn with_session_cookie(state: &AppState, session_id: &str, body: AuthResponse) -> Response {
    let mut response = Json(body).into_response();
    let cookie = build_cookie_header(session_id, &state.session_config, state.session_config.max_age_seconds());
    response.headers_mut().insert(SET_COOKIE, cookie.parse().expect("valid cookie header"));
    response
}
