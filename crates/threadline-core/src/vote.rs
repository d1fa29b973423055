//! Up/down voting on posts and comments.
//!
//! [`apply_vote`] is the pure tri-state machine over a user's membership in an
//! entity's vote sets. [`cast_vote`] runs it against the store and persists
//! only the requesting user's row, conditioned on the direction it read, so
//! concurrent voters never overwrite each other.

use crate::error::{ensure_user, CoreError};
use crate::observability;
use std::collections::BTreeMap;
use thiserror::Error;
use threadline_db::votes::VoteTarget;
use threadline_db::{DbError, DbPool};
use threadline_models::engagement::MyVotes;
use threadline_models::{VoteDirection, VoteSets};

pub const DEFAULT_VOTE_ATTEMPTS: u32 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VoteError {
    #[error("a valid user id is required")]
    MissingUser,
    #[error("vote direction must be \"up\" or \"down\"")]
    InvalidDirection,
}

impl From<VoteError> for CoreError {
    fn from(e: VoteError) -> Self {
        CoreError::InvalidRequest(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTally {
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub effective_direction: VoteDirection,
}

/// Apply `requested` for `user_id`. Re-requesting the current direction
/// clears the vote; requesting the other direction moves it.
pub fn apply_vote(
    votes: &mut VoteSets,
    user_id: i64,
    requested: VoteDirection,
) -> Result<VoteTally, VoteError> {
    if user_id <= 0 {
        return Err(VoteError::MissingUser);
    }
    if !requested.is_cast() {
        return Err(VoteError::InvalidDirection);
    }

    let effective = votes.direction_of(user_id).toggled(requested);
    votes.set_direction(user_id, effective);

    Ok(VoteTally {
        upvote_count: votes.upvote_count(),
        downvote_count: votes.downvote_count(),
        effective_direction: effective,
    })
}

async fn ensure_target_exists(
    pool: &DbPool,
    target: VoteTarget,
    entity_id: i64,
) -> Result<(), CoreError> {
    let exists = match target {
        VoteTarget::Post => threadline_db::posts::post_exists(pool, entity_id).await?,
        VoteTarget::Comment => threadline_db::comments::get_comment(pool, entity_id)
            .await?
            .is_some(),
    };
    if !exists {
        return Err(CoreError::NotFound);
    }
    Ok(())
}

/// Row access used by the vote retry loop.
trait VoteRows {
    async fn load(&self, target: VoteTarget, entity_id: i64) -> Result<VoteSets, DbError>;

    async fn compare_and_set(
        &self,
        target: VoteTarget,
        entity_id: i64,
        user_id: i64,
        expected: VoteDirection,
        next: VoteDirection,
    ) -> Result<bool, DbError>;

    async fn count(&self, target: VoteTarget, entity_id: i64) -> Result<(i64, i64), DbError>;
}

impl VoteRows for DbPool {
    async fn load(&self, target: VoteTarget, entity_id: i64) -> Result<VoteSets, DbError> {
        threadline_db::votes::load_vote_sets(self, target, entity_id).await
    }

    async fn compare_and_set(
        &self,
        target: VoteTarget,
        entity_id: i64,
        user_id: i64,
        expected: VoteDirection,
        next: VoteDirection,
    ) -> Result<bool, DbError> {
        threadline_db::votes::compare_and_set_vote(self, target, entity_id, user_id, expected, next)
            .await
    }

    async fn count(&self, target: VoteTarget, entity_id: i64) -> Result<(i64, i64), DbError> {
        threadline_db::votes::count_votes(self, target, entity_id).await
    }
}

/// Cast a vote against the store, retrying the read-modify-write up to
/// `max_attempts` times when a concurrent request by the same user wins.
pub async fn cast_vote(
    pool: &DbPool,
    target: VoteTarget,
    entity_id: i64,
    user_id: i64,
    requested: VoteDirection,
    max_attempts: u32,
) -> Result<VoteTally, CoreError> {
    ensure_user(user_id)?;
    if !requested.is_cast() {
        return Err(VoteError::InvalidDirection.into());
    }
    ensure_target_exists(pool, target, entity_id).await?;
    write_vote(pool, target, entity_id, user_id, requested, max_attempts).await
}

async fn write_vote<R: VoteRows>(
    rows: &R,
    target: VoteTarget,
    entity_id: i64,
    user_id: i64,
    requested: VoteDirection,
    max_attempts: u32,
) -> Result<VoteTally, CoreError> {
    for attempt in 1..=max_attempts.max(1) {
        let mut votes = rows.load(target, entity_id).await?;
        let before = votes.direction_of(user_id);
        let tally = apply_vote(&mut votes, user_id, requested)?;

        let applied = rows
            .compare_and_set(target, entity_id, user_id, before, tally.effective_direction)
            .await?;

        if applied {
            let (upvote_count, downvote_count) = rows.count(target, entity_id).await?;
            observability::vote_applied();
            tracing::debug!(
                kind = target.as_str(),
                entity_id,
                user_id,
                from = %before,
                to = %tally.effective_direction,
                "vote applied"
            );
            return Ok(VoteTally {
                upvote_count,
                downvote_count,
                effective_direction: tally.effective_direction,
            });
        }

        observability::vote_retried();
        tracing::debug!(
            kind = target.as_str(),
            entity_id,
            user_id,
            attempt,
            "vote row changed concurrently, retrying"
        );
    }

    tracing::warn!(
        kind = target.as_str(),
        entity_id,
        user_id,
        "vote abandoned after repeated concurrent updates"
    );
    Err(CoreError::Conflict(
        "vote was changed concurrently, please retry".into(),
    ))
}

/// A user's standing votes. `None` filters return every vote the user holds.
pub async fn get_user_votes(
    pool: &DbPool,
    user_id: i64,
    post_ids: Option<&[i64]>,
    comment_ids: Option<&[i64]>,
) -> Result<MyVotes, CoreError> {
    ensure_user(user_id)?;

    let posts: BTreeMap<i64, VoteDirection> =
        threadline_db::votes::get_user_votes(pool, VoteTarget::Post, user_id, post_ids)
            .await?
            .into_iter()
            .collect();
    let comments: BTreeMap<i64, VoteDirection> =
        threadline_db::votes::get_user_votes(pool, VoteTarget::Comment, user_id, comment_ids)
            .await?
            .into_iter()
            .collect();

    Ok(MyVotes { posts, comments })
}
