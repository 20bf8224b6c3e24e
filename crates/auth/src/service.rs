//! Authentication service layer: username/password registration and login.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::session::SessionConfig;
use quizbattle_db::{sessions, users, DbPool, User};

/// Result of a successful registration or login: the caller sets a session
/// cookie from `session_id`.
#[derive(Debug)]
pub struct AuthResult {
    pub user_id: String,
    pub username: String,
    pub session_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("username already taken")]
    UsernameTaken,
    #[error("invalid username or password")]
    InvalidCredentials,
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else { return false };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

/// Register a new user and start a session.
pub async fn register(
    pool: &DbPool,
    username: &str,
    password: &str,
    session_config: &SessionConfig,
    ip: Option<&str>,
    user_agent: Option<&str>,
) -> Result<AuthResult, AuthError> {
    if !users::is_username_available(pool, username).await? {
        return Err(AuthError::UsernameTaken);
    }

    let password_hash = hash_password(password)?;
    let user: User = users::create(pool, username, &password_hash).await?;
    let session = sessions::create(pool, &user.id, session_config.ttl_hours, ip, user_agent).await?;

    Ok(AuthResult { user_id: user.id, username: user.username, session_id: session.id })
}

/// Verify credentials and start a new session.
pub async fn login(
    pool: &DbPool,
    username: &str,
    password: &str,
    session_config: &SessionConfig,
    ip: Option<&str>,
    user_agent: Option<&str>,
) -> Result<AuthResult, AuthError> {
    let user = users::get_by_username(pool, username).await?.ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    let session = sessions::create(pool, &user.id, session_config.ttl_hours, ip, user_agent).await?;

    Ok(AuthResult { user_id: user.id, username: user.username, session_id: session.id })
}

/// Revoke the current session.
pub async fn logout(pool: &DbPool, session_id: &str) -> Result<(), AuthError> {
    sessions::revoke(pool, session_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn same_password_hashes_differently_each_time() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b, "argon2 salts must be random per hash");
    }
}
