use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use threadline_models::{Poll, PollOption, PollType};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PollRow {
    pub id: i64,
    pub author_id: i64,
    pub community_id: i64,
    pub question: String,
    pub allow_multiple_votes: bool,
    pub poll_type: String,
    pub show_correct_option: bool,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PollOptionRow {
    pub option_index: i64,
    pub text: String,
    pub is_correct: bool,
}

/// Everything needed to insert a poll and its options.
#[derive(Debug, Clone)]
pub struct NewPoll<'a> {
    pub id: i64,
    pub author_id: i64,
    pub community_id: i64,
    pub question: &'a str,
    pub options: &'a [String],
    pub correct_option_indexes: &'a [usize],
    pub allow_multiple_votes: bool,
    pub poll_type: PollType,
    pub show_correct_option: bool,
    pub expires_at: DateTime<Utc>,
}

pub async fn create_poll(pool: &DbPool, poll: &NewPoll<'_>) -> Result<Poll, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO polls (id, author_id, community_id, question, allow_multiple_votes,
                            poll_type, show_correct_option, expires_at, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9)",
    )
    .bind(poll.id)
    .bind(poll.author_id)
    .bind(poll.community_id)
    .bind(poll.question)
    .bind(poll.allow_multiple_votes)
    .bind(poll.poll_type.as_str())
    .bind(poll.show_correct_option)
    .bind(poll.expires_at)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    for (index, text) in poll.options.iter().enumerate() {
        sqlx::query(
            "INSERT INTO poll_options (poll_id, option_index, text, is_correct)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(poll.id)
        .bind(index as i64)
        .bind(text.as_str())
        .bind(poll.correct_option_indexes.contains(&index))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    get_poll(pool, poll.id).await?.ok_or(DbError::NotFound)
}

/// Load a poll with its option voter sets and ballot set.
pub async fn get_poll(pool: &DbPool, id: i64) -> Result<Option<Poll>, DbError> {
    let Some(row) = sqlx::query_as::<_, PollRow>(
        "SELECT id, author_id, community_id, question, allow_multiple_votes, poll_type,
                show_correct_option, expires_at, is_active, created_at
         FROM polls WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let option_rows = sqlx::query_as::<_, PollOptionRow>(
        "SELECT option_index, text, is_correct
         FROM poll_options WHERE poll_id = ?1
         ORDER BY option_index ASC",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let mut options: Vec<PollOption> = option_rows
        .into_iter()
        .map(|o| PollOption {
            text: o.text,
            is_correct: o.is_correct,
            voters: BTreeSet::new(),
        })
        .collect();

    let option_votes: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT option_index, user_id FROM poll_option_votes WHERE poll_id = ?1",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    for (option_index, user_id) in option_votes {
        if let Some(option) = usize::try_from(option_index)
            .ok()
            .and_then(|i| options.get_mut(i))
        {
            option.voters.insert(user_id);
        }
    }

    let voted_users: Vec<i64> =
        sqlx::query_scalar("SELECT user_id FROM poll_ballots WHERE poll_id = ?1")
            .bind(id)
            .fetch_all(pool)
            .await?;

    Ok(Some(Poll {
        id: row.id,
        author_id: row.author_id,
        community_id: row.community_id,
        question: row.question,
        options,
        voted_users: voted_users.into_iter().collect(),
        allow_multiple_votes: row.allow_multiple_votes,
        poll_type: PollType::parse(&row.poll_type).unwrap_or_default(),
        show_correct_option: row.show_correct_option,
        expires_at: row.expires_at,
        is_active: row.is_active,
        created_at: row.created_at,
    }))
}

/// Persist one ballot atomically. Returns `false` if the user already has a
/// ballot on this poll, in which case nothing is written.
pub async fn record_ballot(
    pool: &DbPool,
    poll_id: i64,
    user_id: i64,
    option_indexes: &[usize],
) -> Result<bool, DbError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        "INSERT INTO poll_ballots (poll_id, user_id, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT (poll_id, user_id) DO NOTHING",
    )
    .bind(poll_id)
    .bind(user_id)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;
    if inserted.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    for index in option_indexes {
        sqlx::query(
            "INSERT INTO poll_option_votes (poll_id, option_index, user_id) VALUES (?1, ?2, ?3)",
        )
        .bind(poll_id)
        .bind(*index as i64)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(true)
}

/// Clear the active flag. Returns `true` only for the call that flipped it.
pub async fn close_poll(pool: &DbPool, poll_id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("UPDATE polls SET is_active = 0 WHERE id = ?1 AND is_active = 1")
        .bind(poll_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn setup_poll(pool: &DbPool, poll_type: PollType, correct: &[usize]) -> Poll {
        let options = vec!["red".to_string(), "green".to_string(), "blue".to_string()];
        create_poll(
            pool,
            &NewPoll {
                id: 1,
                author_id: 10,
                community_id: 20,
                question: "Favourite colour?",
                options: &options,
                correct_option_indexes: correct,
                allow_multiple_votes: true,
                poll_type,
                show_correct_option: true,
                expires_at: Utc::now() + Duration::hours(1),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_poll() {
        let pool = crate::test_pool().await;
        let poll = setup_poll(&pool, PollType::Quiz, &[2]).await;
        assert_eq!(poll.options.len(), 3);
        assert_eq!(poll.options[1].text, "green");
        assert_eq!(poll.correct_option_indexes(), vec![2]);
        assert_eq!(poll.poll_type, PollType::Quiz);
        assert!(poll.is_active);
        assert_eq!(poll.total_votes(), 0);
    }

    #[tokio::test]
    async fn test_get_poll_not_found() {
        let pool = crate::test_pool().await;
        assert!(get_poll(&pool, 404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_ballot_once() {
        let pool = crate::test_pool().await;
        setup_poll(&pool, PollType::Standard, &[]).await;

        assert!(record_ballot(&pool, 1, 7, &[0, 2]).await.unwrap());
        assert!(!record_ballot(&pool, 1, 7, &[1]).await.unwrap());

        let poll = get_poll(&pool, 1).await.unwrap().unwrap();
        assert_eq!(poll.total_votes(), 1);
        assert_eq!(poll.options[0].vote_count(), 1);
        assert_eq!(poll.options[1].vote_count(), 0);
        assert_eq!(poll.options[2].vote_count(), 1);
        assert!(poll.has_voted(7));
    }

    #[tokio::test]
    async fn test_record_ballot_rolls_back_on_bad_option() {
        let pool = crate::test_pool().await;
        setup_poll(&pool, PollType::Standard, &[]).await;

        assert!(record_ballot(&pool, 1, 7, &[0, 9]).await.is_err());
        let poll = get_poll(&pool, 1).await.unwrap().unwrap();
        assert_eq!(poll.total_votes(), 0);
        assert_eq!(poll.options[0].vote_count(), 0);
    }

    #[tokio::test]
    async fn test_close_poll_is_one_shot() {
        let pool = crate::test_pool().await;
        setup_poll(&pool, PollType::Standard, &[]).await;
        assert!(close_poll(&pool, 1).await.unwrap());
        assert!(!close_poll(&pool, 1).await.unwrap());
        let poll = get_poll(&pool, 1).await.unwrap().unwrap();
        assert!(!poll.is_active);
    }
}
