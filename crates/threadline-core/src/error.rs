use thiserror::Error;
use threadline_db::DbError;
use threadline_util::validation::ValidationError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found")]
    NotFound,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    #[error("you have already voted on this poll")]
    AlreadyVoted,
    #[error("this poll has expired")]
    PollExpired,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(DbError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DbError> for CoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => CoreError::NotFound,
            other => CoreError::Database(other),
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(e: ValidationError) -> Self {
        CoreError::InvalidRequest(e.to_string())
    }
}

/// Reject missing or non-positive user ids before touching the store.
pub fn ensure_user(user_id: i64) -> Result<(), CoreError> {
    if user_id <= 0 {
        return Err(CoreError::InvalidRequest(
            "a valid user id is required".into(),
        ));
    }
    Ok(())
}
