//! Authentication middleware and extractors.
//!
//! - `AuthUser`: requires a valid session cookie.
//! - `MaybeAuthUser`: optional authentication, never fails; rooms accept both
//!   registered users and anonymous guests (`spec.md` §6, `user_id?` on join).

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts, StatusCode},
};

use crate::session::SessionConfig;

/// Authenticated user extracted from a session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub session_id: String,
}

/// Optional authentication extractor: `Some` if a valid session exists, `None`
/// otherwise. Never rejects the request.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

/// Trait for application state that supports auth extraction.
pub trait AuthState: Clone + Send + Sync + 'static {
    fn db_pool(&self) -> &sqlx::PgPool;
    fn session_config(&self) -> &SessionConfig;
}

/// Extract session ID from the Cookie header. If multiple cookies share the
/// name, the last one wins (most recently set).
fn extract_session_id(parts: &Parts, cookie_name: &str) -> Option<String> {
    let cookie_header = parts.headers.get(COOKIE)?.to_str().ok()?;
    let prefix = format!("{}=", cookie_name);

    cookie_header
        .split(';')
        .filter_map(|cookie| {
            let cookie = cookie.trim();
            cookie.strip_prefix(&prefix).map(|v| v.to_string())
        })
        .last()
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: AuthState,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session_config = state.session_config();
        let pool = state.db_pool();

        let session_id = extract_session_id(parts, &session_config.cookie_name)
            .ok_or((StatusCode::UNAUTHORIZED, "No session cookie"))?;

        let session = quizbattle_db::sessions::get_valid(pool, &session_id)
            .await
            .map_err(|e| {
                tracing::error!("database error validating session: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            })?
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid session"))?;

        let user = quizbattle_db::users::get_by_id(pool, &session.user_id)
            .await
            .map_err(|e| {
                tracing::error!("database error fetching user: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            })?
            .ok_or((StatusCode::UNAUTHORIZED, "User not found"))?;

        let pool_clone = pool.clone();
        let sid_clone = session_id.clone();
        tokio::spawn(async move {
            let _ = quizbattle_db::sessions::touch(&pool_clone, &sid_clone).await;
        });

        Ok(AuthUser { user_id: session.user_id, username: user.username, session_id })
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: AuthState,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(AuthUser::from_request_parts(parts, state).await.ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn extract_session_id_reads_cookie() {
        let req = Request::builder().header(COOKIE, "quizbattle_sid=ses_test123; other=value").body(()).unwrap();

        let (parts, _body) = req.into_parts();
        assert_eq!(extract_session_id(&parts, "quizbattle_sid"), Some("ses_test123".to_string()));
    }

    #[test]
    fn extract_session_id_missing_cookie_header() {
        let req = Request::builder().body(()).unwrap();

        let (parts, _body) = req.into_parts();
        assert_eq!(extract_session_id(&parts, "quizbattle_sid"), None);
    }

    #[test]
    fn extract_session_id_takes_last_of_duplicates() {
        let req = Request::builder()
            .header(COOKIE, "quizbattle_sid=ses_old; other=value; quizbattle_sid=ses_new")
            .body(())
            .unwrap();

        let (parts, _body) = req.into_parts();
        assert_eq!(extract_session_id(&parts, "quizbattle_sid"), Some("ses_new".to_string()));
    }
}
