use crate::{DbError, DbPool};
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashMap;
use threadline_models::{VoteDirection, VoteSets};

/// Which kind of entity a vote row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteTarget {
    Post,
    Comment,
}

impl VoteTarget {
    fn table(self) -> &'static str {
        match self {
            VoteTarget::Post => "post_votes",
            VoteTarget::Comment => "comment_votes",
        }
    }

    fn entity_column(self) -> &'static str {
        match self {
            VoteTarget::Post => "post_id",
            VoteTarget::Comment => "comment_id",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoteTarget::Post => "post",
            VoteTarget::Comment => "comment",
        }
    }
}

fn rows_to_sets(rows: Vec<(i64, i64)>) -> VoteSets {
    VoteSets::from_rows(
        rows.into_iter()
            .map(|(user_id, direction)| (user_id, VoteDirection::from_db(Some(direction)))),
    )
}

pub async fn load_vote_sets(
    pool: &DbPool,
    target: VoteTarget,
    entity_id: i64,
) -> Result<VoteSets, DbError> {
    let sql = format!(
        "SELECT user_id, direction FROM {} WHERE {} = ?1",
        target.table(),
        target.entity_column()
    );
    let rows: Vec<(i64, i64)> = sqlx::query_as(&sql)
        .bind(entity_id)
        .fetch_all(pool)
        .await?;
    Ok(rows_to_sets(rows))
}

/// Vote sets for every comment on a post, in one query.
pub async fn load_comment_vote_sets_for_post(
    pool: &DbPool,
    post_id: i64,
) -> Result<HashMap<i64, VoteSets>, DbError> {
    let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
        "SELECT v.comment_id, v.user_id, v.direction
         FROM comment_votes v
         INNER JOIN comments c ON c.id = v.comment_id
         WHERE c.post_id = ?1",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    let mut by_comment: HashMap<i64, VoteSets> = HashMap::new();
    for (comment_id, user_id, direction) in rows {
        by_comment
            .entry(comment_id)
            .or_default()
            .set_direction(user_id, VoteDirection::from_db(Some(direction)));
    }
    Ok(by_comment)
}

pub async fn get_user_direction(
    pool: &DbPool,
    target: VoteTarget,
    entity_id: i64,
    user_id: i64,
) -> Result<VoteDirection, DbError> {
    let sql = format!(
        "SELECT direction FROM {} WHERE {} = ?1 AND user_id = ?2",
        target.table(),
        target.entity_column()
    );
    let direction: Option<i64> = sqlx::query_scalar(&sql)
        .bind(entity_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(VoteDirection::from_db(direction))
}

/// Move `user_id` from `expected` to `next` on one entity, but only if the
/// stored direction still equals `expected`. Returns `false` when another
/// request changed the row first; nothing is written in that case.
pub async fn compare_and_set_vote(
    pool: &DbPool,
    target: VoteTarget,
    entity_id: i64,
    user_id: i64,
    expected: VoteDirection,
    next: VoteDirection,
) -> Result<bool, DbError> {
    let table = target.table();
    let column = target.entity_column();

    let result = match (expected.as_db(), next.as_db()) {
        (None, None) => {
            let current = get_user_direction(pool, target, entity_id, user_id).await?;
            return Ok(current == VoteDirection::None);
        }
        (None, Some(next)) => {
            let sql = format!(
                "INSERT INTO {table} ({column}, user_id, direction) VALUES (?1, ?2, ?3)
                 ON CONFLICT ({column}, user_id) DO NOTHING"
            );
            sqlx::query(&sql)
                .bind(entity_id)
                .bind(user_id)
                .bind(next)
                .execute(pool)
                .await?
        }
        (Some(expected), None) => {
            let sql = format!(
                "DELETE FROM {table} WHERE {column} = ?1 AND user_id = ?2 AND direction = ?3"
            );
            sqlx::query(&sql)
                .bind(entity_id)
                .bind(user_id)
                .bind(expected)
                .execute(pool)
                .await?
        }
        (Some(expected), Some(next)) => {
            let sql = format!(
                "UPDATE {table} SET direction = ?3
                 WHERE {column} = ?1 AND user_id = ?2 AND direction = ?4"
            );
            sqlx::query(&sql)
                .bind(entity_id)
                .bind(user_id)
                .bind(next)
                .bind(expected)
                .execute(pool)
                .await?
        }
    };

    Ok(result.rows_affected() == 1)
}

/// `(upvotes, downvotes)` derived from membership rows.
pub async fn count_votes(
    pool: &DbPool,
    target: VoteTarget,
    entity_id: i64,
) -> Result<(i64, i64), DbError> {
    let sql = format!(
        "SELECT COALESCE(SUM(CASE WHEN direction > 0 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN direction < 0 THEN 1 ELSE 0 END), 0)
         FROM {} WHERE {} = ?1",
        target.table(),
        target.entity_column()
    );
    let counts: (i64, i64) = sqlx::query_as(&sql)
        .bind(entity_id)
        .fetch_one(pool)
        .await?;
    Ok(counts)
}

/// Standing votes of one user, optionally restricted to a batch of entity ids.
pub async fn get_user_votes(
    pool: &DbPool,
    target: VoteTarget,
    user_id: i64,
    only: Option<&[i64]>,
) -> Result<Vec<(i64, VoteDirection)>, DbError> {
    let column = target.entity_column();
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {column}, direction FROM {} WHERE user_id = ",
        target.table()
    ));
    builder.push_bind(user_id);

    if let Some(ids) = only {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        builder.push(format!(" AND {column} IN ("));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
    }
    builder.push(format!(" ORDER BY {column}"));

    let rows: Vec<(i64, i64)> = builder.build_query_as().fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(id, direction)| (id, VoteDirection::from_db(Some(direction))))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup(pool: &DbPool) {
        crate::posts::create_post(pool, 1, 10, 20, "one", "").await.unwrap();
        crate::posts::create_post(pool, 2, 10, 20, "two", "").await.unwrap();
        crate::comments::create_comment(pool, 50, 1, None, 10, "c")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_compare_and_set_insert_move_delete() {
        let pool = crate::test_pool().await;
        setup(&pool).await;
        let t = VoteTarget::Post;

        assert!(
            compare_and_set_vote(&pool, t, 1, 7, VoteDirection::None, VoteDirection::Up)
                .await
                .unwrap()
        );
        assert_eq!(get_user_direction(&pool, t, 1, 7).await.unwrap(), VoteDirection::Up);
        assert_eq!(count_votes(&pool, t, 1).await.unwrap(), (1, 0));

        assert!(
            compare_and_set_vote(&pool, t, 1, 7, VoteDirection::Up, VoteDirection::Down)
                .await
                .unwrap()
        );
        assert_eq!(count_votes(&pool, t, 1).await.unwrap(), (0, 1));

        assert!(
            compare_and_set_vote(&pool, t, 1, 7, VoteDirection::Down, VoteDirection::None)
                .await
                .unwrap()
        );
        assert_eq!(count_votes(&pool, t, 1).await.unwrap(), (0, 0));
        assert_eq!(
            get_user_direction(&pool, t, 1, 7).await.unwrap(),
            VoteDirection::None
        );
    }

    #[tokio::test]
    async fn test_compare_and_set_rejects_stale_expectation() {
        let pool = crate::test_pool().await;
        setup(&pool).await;
        let t = VoteTarget::Post;
        compare_and_set_vote(&pool, t, 1, 7, VoteDirection::None, VoteDirection::Up)
            .await
            .unwrap();

        // A second writer that still believes there is no vote must not win.
        let applied =
            compare_and_set_vote(&pool, t, 1, 7, VoteDirection::None, VoteDirection::Down)
                .await
                .unwrap();
        assert!(!applied);
        let stale_delete =
            compare_and_set_vote(&pool, t, 1, 7, VoteDirection::Down, VoteDirection::None)
                .await
                .unwrap();
        assert!(!stale_delete);
        assert_eq!(count_votes(&pool, t, 1).await.unwrap(), (1, 0));
    }

    #[tokio::test]
    async fn test_load_vote_sets_and_user_votes() {
        let pool = crate::test_pool().await;
        setup(&pool).await;
        let t = VoteTarget::Post;
        compare_and_set_vote(&pool, t, 1, 7, VoteDirection::None, VoteDirection::Up)
            .await
            .unwrap();
        compare_and_set_vote(&pool, t, 1, 8, VoteDirection::None, VoteDirection::Down)
            .await
            .unwrap();
        compare_and_set_vote(&pool, t, 2, 7, VoteDirection::None, VoteDirection::Down)
            .await
            .unwrap();

        let sets = load_vote_sets(&pool, t, 1).await.unwrap();
        assert_eq!(sets.direction_of(7), VoteDirection::Up);
        assert_eq!(sets.direction_of(8), VoteDirection::Down);
        assert_eq!(sets.upvote_count(), 1);

        let all = get_user_votes(&pool, t, 7, None).await.unwrap();
        assert_eq!(all, vec![(1, VoteDirection::Up), (2, VoteDirection::Down)]);
        let filtered = get_user_votes(&pool, t, 7, Some(&[2, 99])).await.unwrap();
        assert_eq!(filtered, vec![(2, VoteDirection::Down)]);
        assert!(get_user_votes(&pool, t, 7, Some(&[])).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_vote_sets_for_post() {
        let pool = crate::test_pool().await;
        setup(&pool).await;
        compare_and_set_vote(
            &pool,
            VoteTarget::Comment,
            50,
            7,
            VoteDirection::None,
            VoteDirection::Down,
        )
        .await
        .unwrap();

        let by_comment = load_comment_vote_sets_for_post(&pool, 1).await.unwrap();
        assert_eq!(by_comment[&50].direction_of(7), VoteDirection::Down);
        assert!(load_comment_vote_sets_for_post(&pool, 2)
            .await
            .unwrap()
            .is_empty());
    }
}
