//! Poll ballots and the lazy Active -> Closed transition.

use crate::error::{ensure_user, CoreError};
use crate::observability;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;
use threadline_db::polls::NewPoll;
use threadline_db::DbPool;
use threadline_models::engagement::CreatePollRequest;
use threadline_models::{Poll, PollType};
use threadline_util::validation::{validate_text, MAX_POLL_OPTION_LEN, MAX_POLL_QUESTION_LEN};

pub const MIN_POLL_OPTIONS: usize = 2;
pub const MAX_POLL_OPTIONS: usize = 10;

/// Ballot rejections, in the order they are checked.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollError {
    #[error("{0}")]
    InvalidSelection(String),
    #[error("you have already voted on this poll")]
    AlreadyVoted,
    #[error("this poll has expired")]
    PollExpired,
}

impl PollError {
    pub fn reason(&self) -> &'static str {
        match self {
            PollError::InvalidSelection(_) => "INVALID_SELECTION",
            PollError::AlreadyVoted => "ALREADY_VOTED",
            PollError::PollExpired => "POLL_EXPIRED",
        }
    }
}

impl From<PollError> for CoreError {
    fn from(e: PollError) -> Self {
        match e {
            PollError::InvalidSelection(msg) => CoreError::InvalidSelection(msg),
            PollError::AlreadyVoted => CoreError::AlreadyVoted,
            PollError::PollExpired => CoreError::PollExpired,
        }
    }
}

fn validate_selection(poll: &Poll, selection: &[usize]) -> Result<(), PollError> {
    if selection.is_empty() {
        return Err(PollError::InvalidSelection(
            "select at least one option".into(),
        ));
    }
    if let Some(index) = selection.iter().find(|&&i| i >= poll.options.len()) {
        return Err(PollError::InvalidSelection(format!(
            "option {index} does not exist"
        )));
    }
    let mut seen = HashSet::with_capacity(selection.len());
    if !selection.iter().all(|i| seen.insert(*i)) {
        return Err(PollError::InvalidSelection(
            "an option was selected more than once".into(),
        ));
    }
    if selection.len() > 1 && !poll.allow_multiple_votes {
        return Err(PollError::InvalidSelection(
            "this poll accepts a single option".into(),
        ));
    }
    Ok(())
}

/// Record one ballot in memory. A ballot may select several options when the
/// poll allows it, but it always counts as a single vote and is final.
pub fn cast_ballot(
    poll: &mut Poll,
    user_id: i64,
    selection: &[usize],
    now: DateTime<Utc>,
) -> Result<(), PollError> {
    validate_selection(poll, selection)?;
    if poll.has_voted(user_id) {
        return Err(PollError::AlreadyVoted);
    }
    if !poll.is_open_at(now) {
        return Err(PollError::PollExpired);
    }

    for &index in selection {
        poll.options[index].voters.insert(user_id);
    }
    poll.voted_users.insert(user_id);
    Ok(())
}

pub fn validate_new_poll(req: &CreatePollRequest, now: DateTime<Utc>) -> Result<(), CoreError> {
    validate_text("poll question", &req.question, MAX_POLL_QUESTION_LEN)?;

    if req.options.len() < MIN_POLL_OPTIONS || req.options.len() > MAX_POLL_OPTIONS {
        return Err(CoreError::InvalidRequest(format!(
            "a poll needs between {MIN_POLL_OPTIONS} and {MAX_POLL_OPTIONS} options"
        )));
    }
    for option in &req.options {
        validate_text("poll option", option, MAX_POLL_OPTION_LEN)?;
    }
    if req.expires_at <= now {
        return Err(CoreError::InvalidRequest(
            "expires_at must be in the future".into(),
        ));
    }

    match req.poll_type {
        PollType::Quiz => {
            if req.correct_option_indexes.is_empty() {
                return Err(CoreError::InvalidRequest(
                    "quiz polls need at least one correct option".into(),
                ));
            }
            if req
                .correct_option_indexes
                .iter()
                .any(|&i| i >= req.options.len())
            {
                return Err(CoreError::InvalidRequest(
                    "correct option index out of range".into(),
                ));
            }
            let distinct: HashSet<usize> = req.correct_option_indexes.iter().copied().collect();
            if distinct.len() > 1 && !req.allow_multiple_votes {
                return Err(CoreError::InvalidRequest(
                    "single-choice quizzes have exactly one correct option".into(),
                ));
            }
        }
        PollType::Standard => {
            if !req.correct_option_indexes.is_empty() {
                return Err(CoreError::InvalidRequest(
                    "only quiz polls have correct options".into(),
                ));
            }
        }
    }
    Ok(())
}

pub async fn create_poll(
    pool: &DbPool,
    poll_id: i64,
    author_id: i64,
    req: &CreatePollRequest,
    now: DateTime<Utc>,
) -> Result<Poll, CoreError> {
    ensure_user(author_id)?;
    validate_new_poll(req, now)?;

    let options: Vec<String> = req.options.iter().map(|o| o.trim().to_string()).collect();
    let poll = threadline_db::polls::create_poll(
        pool,
        &NewPoll {
            id: poll_id,
            author_id,
            community_id: req.community_id,
            question: req.question.trim(),
            options: &options,
            correct_option_indexes: &req.correct_option_indexes,
            allow_multiple_votes: req.allow_multiple_votes,
            poll_type: req.poll_type,
            show_correct_option: req.show_correct_option,
            expires_at: req.expires_at,
        },
    )
    .await?;

    tracing::info!(poll_id, author_id, poll_type = req.poll_type.as_str(), "poll created");
    Ok(poll)
}

/// Load a poll, closing it in the store if it has expired since the last read.
pub async fn get_poll(pool: &DbPool, poll_id: i64, now: DateTime<Utc>) -> Result<Poll, CoreError> {
    let mut poll = threadline_db::polls::get_poll(pool, poll_id)
        .await?
        .ok_or(CoreError::NotFound)?;

    if poll.close_if_expired(now) && threadline_db::polls::close_poll(pool, poll_id).await? {
        observability::poll_closed();
        tracing::info!(poll_id, expires_at = %poll.expires_at, "poll closed");
    }
    Ok(poll)
}

/// Validate and persist a ballot, returning the poll as stored afterwards.
pub async fn submit_ballot(
    pool: &DbPool,
    poll_id: i64,
    user_id: i64,
    selection: &[usize],
    now: DateTime<Utc>,
) -> Result<Poll, CoreError> {
    ensure_user(user_id)?;
    let mut poll = get_poll(pool, poll_id, now).await?;

    if let Err(e) = cast_ballot(&mut poll, user_id, selection, now) {
        observability::ballot_rejected(e.reason());
        tracing::debug!(poll_id, user_id, reason = e.reason(), "ballot rejected");
        return Err(e.into());
    }

    let recorded = threadline_db::polls::record_ballot(pool, poll_id, user_id, selection).await?;
    if !recorded {
        // Another request from the same user got its ballot in first.
        let e = PollError::AlreadyVoted;
        observability::ballot_rejected(e.reason());
        return Err(e.into());
    }

    observability::ballot_accepted();
    tracing::debug!(poll_id, user_id, options = ?selection, "ballot recorded");
    get_poll(pool, poll_id, now).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::BTreeSet;
    use threadline_models::PollOption;

    fn poll(now: DateTime<Utc>, allow_multiple_votes: bool) -> Poll {
        Poll {
            id: 1,
            author_id: 2,
            community_id: 3,
            question: "Pick".into(),
            options: (0..3)
                .map(|i| PollOption {
                    text: format!("option {i}"),
                    is_correct: false,
                    voters: BTreeSet::new(),
                })
                .collect(),
            voted_users: BTreeSet::new(),
            allow_multiple_votes,
            poll_type: PollType::Standard,
            show_correct_option: false,
            expires_at: now + Duration::hours(1),
            is_active: true,
            created_at: now,
        }
    }

    fn counts(poll: &Poll) -> Vec<i64> {
        poll.options.iter().map(|o| o.vote_count()).collect()
    }

    #[test]
    fn multi_select_counts_one_ballot() {
        let now = Utc::now();
        let mut p = poll(now, true);
        cast_ballot(&mut p, 9, &[0, 2], now).unwrap();
        assert_eq!(counts(&p), vec![1, 0, 1]);
        assert_eq!(p.total_votes(), 1);
    }

    #[test]
    fn second_ballot_is_already_voted_and_changes_nothing() {
        let now = Utc::now();
        let mut p = poll(now, false);
        cast_ballot(&mut p, 9, &[1], now).unwrap();
        let before = counts(&p);
        assert_eq!(cast_ballot(&mut p, 9, &[0], now), Err(PollError::AlreadyVoted));
        assert_eq!(counts(&p), before);
        assert_eq!(p.total_votes(), 1);
    }

    #[test]
    fn expired_ballot_changes_nothing() {
        let now = Utc::now();
        let mut p = poll(now, false);
        let later = now + Duration::hours(2);
        assert_eq!(cast_ballot(&mut p, 9, &[0], later), Err(PollError::PollExpired));
        assert_eq!(counts(&p), vec![0, 0, 0]);
        assert_eq!(p.total_votes(), 0);
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let mut p = poll(now, false);
        let at = p.expires_at;
        assert_eq!(cast_ballot(&mut p, 9, &[0], at), Err(PollError::PollExpired));
    }

    #[test]
    fn selection_checks_come_first() {
        let now = Utc::now();
        let mut p = poll(now, false);
        p.voted_users.insert(9);
        p.is_active = false;
        // Even for a closed poll the caller already voted on, a bad selection
        // is reported as such.
        assert!(matches!(
            cast_ballot(&mut p, 9, &[], now),
            Err(PollError::InvalidSelection(_))
        ));
        assert!(matches!(
            cast_ballot(&mut p, 9, &[5], now),
            Err(PollError::InvalidSelection(_))
        ));
        assert_eq!(cast_ballot(&mut p, 9, &[0], now), Err(PollError::AlreadyVoted));
        assert_eq!(cast_ballot(&mut p, 10, &[0], now), Err(PollError::PollExpired));
    }

    #[test]
    fn single_choice_rejects_multiple_and_duplicates() {
        let now = Utc::now();
        let mut p = poll(now, false);
        assert!(matches!(
            cast_ballot(&mut p, 9, &[0, 1], now),
            Err(PollError::InvalidSelection(_))
        ));
        let mut multi = poll(now, true);
        assert!(matches!(
            cast_ballot(&mut multi, 9, &[1, 1], now),
            Err(PollError::InvalidSelection(_))
        ));
    }

    fn request(now: DateTime<Utc>) -> CreatePollRequest {
        CreatePollRequest {
            community_id: 3,
            question: "Capital of France?".into(),
            options: vec!["Paris".into(), "Lyon".into()],
            allow_multiple_votes: false,
            poll_type: PollType::Quiz,
            correct_option_indexes: vec![0],
            show_correct_option: true,
            expires_at: now + Duration::days(1),
        }
    }

    #[test]
    fn quiz_without_correct_options_is_rejected() {
        let now = Utc::now();
        let mut req = request(now);
        req.correct_option_indexes.clear();
        assert!(matches!(
            validate_new_poll(&req, now),
            Err(CoreError::InvalidRequest(_))
        ));
    }

    #[test]
    fn poll_creation_validation() {
        let now = Utc::now();
        assert!(validate_new_poll(&request(now), now).is_ok());

        let mut past = request(now);
        past.expires_at = now - Duration::seconds(1);
        assert!(validate_new_poll(&past, now).is_err());

        let mut one_option = request(now);
        one_option.options.truncate(1);
        assert!(validate_new_poll(&one_option, now).is_err());

        let mut out_of_range = request(now);
        out_of_range.correct_option_indexes = vec![4];
        assert!(validate_new_poll(&out_of_range, now).is_err());

        let mut standard_with_answers = request(now);
        standard_with_answers.poll_type = PollType::Standard;
        assert!(validate_new_poll(&standard_with_answers, now).is_err());
    }

    async fn store() -> DbPool {
        let pool = threadline_db::create_pool("sqlite::memory:", 1).await.unwrap();
        threadline_db::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn submit_ballot_persists_and_rejects_repeat() {
        let pool = store().await;
        let now = Utc::now();
        let mut req = request(now);
        req.poll_type = PollType::Standard;
        req.correct_option_indexes.clear();
        req.allow_multiple_votes = true;
        req.options.push("Marseille".into());
        create_poll(&pool, 1, 2, &req, now).await.unwrap();

        let updated = submit_ballot(&pool, 1, 9, &[0, 2], now).await.unwrap();
        assert_eq!(counts(&updated), vec![1, 0, 1]);
        assert_eq!(updated.total_votes(), 1);

        let err = submit_ballot(&pool, 1, 9, &[1], now).await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyVoted));
        let stored = get_poll(&pool, 1, now).await.unwrap();
        assert_eq!(counts(&stored), vec![1, 0, 1]);
    }

    #[tokio::test]
    async fn expired_poll_is_closed_lazily_on_read() {
        let pool = store().await;
        let now = Utc::now();
        create_poll(&pool, 1, 2, &request(now), now).await.unwrap();

        let later = now + Duration::days(2);
        let err = submit_ballot(&pool, 1, 9, &[0], later).await.unwrap_err();
        assert!(matches!(err, CoreError::PollExpired));

        let stored = threadline_db::polls::get_poll(&pool, 1).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.total_votes(), 0);

        // Reading again "before" expiry never reopens it.
        let reread = get_poll(&pool, 1, now).await.unwrap();
        assert!(!reread.is_open_at(now));
    }

    #[tokio::test]
    async fn unknown_poll_is_not_found() {
        let pool = store().await;
        let err = submit_ballot(&pool, 404, 9, &[0], Utc::now()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound));
    }
}
