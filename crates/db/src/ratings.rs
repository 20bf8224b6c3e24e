//! Global rating read-model for `GET /rating/data` (`spec.md` §6).

use sqlx::FromRow;

use crate::DbPool;

#[derive(Debug, Clone, FromRow)]
pub struct RatingRow {
    pub user_id: String,
    pub username: String,
    pub wins: i32,
    pub games_finished: i32,
}

/// All-time ranking by wins, ties broken by total score. Registered users only;
/// guests leave no `users` row to rank.
pub async fn get_rating(pool: &DbPool, limit: i64) -> Result<Vec<RatingRow>, sqlx::Error> {
    sqlx::query_as!(
        RatingRow,
        r#"
        SELECT id as user_id, username, wins, games_played as games_finished
        FROM users
        WHERE games_played > 0
        ORDER BY wins DESC, total_score DESC
        LIMIT $1
        "#,
        limit
    )
    .fetch_all(pool)
    .await
}
