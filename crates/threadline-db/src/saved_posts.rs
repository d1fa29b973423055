use crate::{DbError, DbPool};
use chrono::Utc;

/// Flip the saved state of a post for a user. Returns the new state.
pub async fn toggle_saved_post(pool: &DbPool, user_id: i64, post_id: i64) -> Result<bool, DbError> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM saved_posts WHERE user_id = ?1 AND post_id = ?2")
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
    let saved = if removed.rows_affected() > 0 {
        false
    } else {
        sqlx::query(
            "INSERT INTO saved_posts (user_id, post_id, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, post_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(post_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        true
    };

    tx.commit().await?;
    Ok(saved)
}

/// Most recently saved first.
pub async fn get_saved_post_ids(pool: &DbPool, user_id: i64) -> Result<Vec<i64>, DbError> {
    let ids = sqlx::query_scalar(
        "SELECT post_id FROM saved_posts WHERE user_id = ?1 ORDER BY created_at DESC, post_id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
