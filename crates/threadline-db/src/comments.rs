use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub author_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create_comment(
    pool: &DbPool,
    id: i64,
    post_id: i64,
    parent_comment_id: Option<i64>,
    author_id: i64,
    body: &str,
) -> Result<CommentRow, DbError> {
    let row = sqlx::query_as::<_, CommentRow>(
        "INSERT INTO comments (id, post_id, parent_comment_id, author_id, body, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING id, post_id, parent_comment_id, author_id, body, created_at",
    )
    .bind(id)
    .bind(post_id)
    .bind(parent_comment_id)
    .bind(author_id)
    .bind(body)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_comment(pool: &DbPool, id: i64) -> Result<Option<CommentRow>, DbError> {
    let row = sqlx::query_as::<_, CommentRow>(
        "SELECT id, post_id, parent_comment_id, author_id, body, created_at
         FROM comments WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// All comments on a post in creation order (ids are time-ordered).
pub async fn get_post_comments(pool: &DbPool, post_id: i64) -> Result<Vec<CommentRow>, DbError> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT id, post_id, parent_comment_id, author_id, body, created_at
         FROM comments
         WHERE post_id = ?1
         ORDER BY id ASC",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_post_comment_ids(pool: &DbPool, post_id: i64) -> Result<Vec<i64>, DbError> {
    let ids = sqlx::query_scalar("SELECT id FROM comments WHERE post_id = ?1 ORDER BY id ASC")
        .bind(post_id)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}
