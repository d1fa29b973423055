use crate::error::{ensure_user, CoreError};
use threadline_db::DbPool;

/// Flip whether `user_id` has saved the post. Returns the new state.
pub async fn toggle_saved(pool: &DbPool, user_id: i64, post_id: i64) -> Result<bool, CoreError> {
    ensure_user(user_id)?;
    if !threadline_db::posts::post_exists(pool, post_id).await? {
        return Err(CoreError::NotFound);
    }
    let saved = threadline_db::saved_posts::toggle_saved_post(pool, user_id, post_id).await?;
    tracing::debug!(user_id, post_id, saved, "saved state toggled");
    Ok(saved)
}

pub async fn list_saved(pool: &DbPool, user_id: i64) -> Result<Vec<i64>, CoreError> {
    ensure_user(user_id)?;
    Ok(threadline_db::saved_posts::get_saved_post_ids(pool, user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn toggle_twice_restores() {
        let pool = threadline_db::create_pool("sqlite::memory:", 1).await.unwrap();
        threadline_db::run_migrations(&pool).await.unwrap();
        threadline_db::posts::create_post(&pool, 1, 10, 20, "p", "")
            .await
            .unwrap();

        assert!(toggle_saved(&pool, 7, 1).await.unwrap());
        assert_eq!(list_saved(&pool, 7).await.unwrap(), vec![1]);
        assert!(!toggle_saved(&pool, 7, 1).await.unwrap());
        assert!(list_saved(&pool, 7).await.unwrap().is_empty());

        assert!(matches!(
            toggle_saved(&pool, 7, 2).await,
            Err(CoreError::NotFound)
        ));
    }
}
