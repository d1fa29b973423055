use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub author_id: i64,
    pub community_id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create_post(
    pool: &DbPool,
    id: i64,
    author_id: i64,
    community_id: i64,
    title: &str,
    body: &str,
) -> Result<PostRow, DbError> {
    let row = sqlx::query_as::<_, PostRow>(
        "INSERT INTO posts (id, author_id, community_id, title, body, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id, author_id, community_id, title, body, created_at",
    )
    .bind(id)
    .bind(author_id)
    .bind(community_id)
    .bind(title)
    .bind(body)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_post(pool: &DbPool, id: i64) -> Result<Option<PostRow>, DbError> {
    let row = sqlx::query_as::<_, PostRow>(
        "SELECT id, author_id, community_id, title, body, created_at
         FROM posts WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn post_exists(pool: &DbPool, id: i64) -> Result<bool, DbError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM posts WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get_post() {
        let pool = crate::test_pool().await;
        let created = create_post(&pool, 1, 10, 20, "Hello", "World").await.unwrap();
        assert_eq!(created.title, "Hello");

        let fetched = get_post(&pool, 1).await.unwrap().unwrap();
        assert_eq!(fetched.author_id, 10);
        assert_eq!(fetched.community_id, 20);
        assert_eq!(fetched.body, "World");
        assert!(post_exists(&pool, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_post_not_found() {
        let pool = crate::test_pool().await;
        assert!(get_post(&pool, 999).await.unwrap().is_none());
        assert!(!post_exists(&pool, 999).await.unwrap());
    }
}
