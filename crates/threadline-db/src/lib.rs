pub mod comments;
pub mod polls;
pub mod posts;
pub mod saved_posts;
pub mod votes;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub type DbPool = sqlx::SqlitePool;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("not found")]
    NotFound,
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("migrations: applied successfully");
    Ok(())
}

/// Cheap liveness probe for health checks.
pub async fn ping(pool: &DbPool) -> Result<(), DbError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let pool = create_pool("sqlite::memory:", 1).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::{create_pool, run_migrations};

    #[tokio::test]
    async fn create_pool_supports_default_sqlite_mode() {
        let pool = create_pool("sqlite::memory:", 1).await.expect("pool");
        let value: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query");
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn migrations_create_engagement_tables() {
        let pool = create_pool("sqlite::memory:", 1).await.expect("pool");
        run_migrations(&pool).await.expect("migrations");

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .expect("list tables");
        for expected in [
            "comment_votes",
            "comments",
            "poll_ballots",
            "poll_option_votes",
            "poll_options",
            "polls",
            "post_votes",
            "posts",
            "saved_posts",
        ] {
            assert!(
                tables.iter().any(|t| t == expected),
                "missing table {expected}"
            );
        }
    }

    #[tokio::test]
    async fn vote_rows_reject_invalid_direction() {
        let pool = create_pool("sqlite::memory:", 1).await.expect("pool");
        run_migrations(&pool).await.expect("migrations");
        crate::posts::create_post(&pool, 1, 10, 20, "title", "")
            .await
            .expect("post");

        let err = sqlx::query("INSERT INTO post_votes (post_id, user_id, direction) VALUES (1, 5, 3)")
            .execute(&pool)
            .await;
        assert!(err.is_err());
    }
}
