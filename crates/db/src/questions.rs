//! Deck persistence (`questions` table).
//!
//! The room actor holds the authoritative in-memory deck
//! (`quizbattle_core::game::QuestionState`); these rows exist so a process
//! restart can reconstruct a room up to its last answered question.

use sqlx::FromRow;

use crate::games::TeamColumn;
use crate::DbPool;

#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: String, // qst_XXXXXXXXXXXX
    pub game_id: String,
    pub team: TeamColumn,
    pub order_index: i16,
    pub text: String,
    pub option_1: String,
    pub option_2: String,
    pub option_3: String,
    pub option_4: String,
    pub correct_option: i16, // zero-based
    pub answered: bool,
}

impl QuestionRow {
    pub fn options(&self) -> [String; 4] {
        [self.option_1.clone(), self.option_2.clone(), self.option_3.clone(), self.option_4.clone()]
    }
}

/// One deck entry ready to insert; `correct_option` is already zero-based.
pub struct NewQuestion {
    pub id: String,
    pub team: TeamColumn,
    pub order_index: i16,
    pub text: String,
    pub options: [String; 4],
    pub correct_option: i16,
}

/// Insert a freshly built deck in a single transaction.
pub async fn insert_deck(pool: &DbPool, game_id: &str, deck: &[NewQuestion]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for q in deck {
        sqlx::query!(
            r#"
            INSERT INTO questions (id, game_id, team, order_index, text, option_1, option_2, option_3, option_4, correct_option, answered)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE)
            "#,
            q.id,
            game_id,
            q.team as TeamColumn,
            q.order_index,
            q.text,
            q.options[0],
            q.options[1],
            q.options[2],
            q.options[3],
            q.correct_option,
        )
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub async fn get_by_room(pool: &DbPool, game_id: &str) -> Result<Vec<QuestionRow>, sqlx::Error> {
    sqlx::query_as!(
        QuestionRow,
        r#"
        SELECT id, game_id, team as "team: TeamColumn", order_index, text,
               option_1, option_2, option_3, option_4, correct_option, answered
        FROM questions WHERE game_id = $1 ORDER BY team, order_index ASC
        "#,
        game_id
    )
    .fetch_all(pool)
    .await
}

pub async fn mark_answered(pool: &DbPool, question_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query!("UPDATE questions SET answered = TRUE WHERE id = $1", question_id).execute(pool).await?;
    Ok(())
}

/// Delete the current deck ahead of a `restart` command building a new one.
pub async fn delete_by_room(pool: &DbPool, game_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query!("DELETE FROM questions WHERE game_id = $1", game_id).execute(pool).await?;
    Ok(())
}
