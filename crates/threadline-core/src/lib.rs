pub mod auth;
pub mod comment;
pub mod comment_tree;
pub mod error;
pub mod observability;
pub mod poll;
pub mod post;
pub mod saved;
pub mod vote;

pub use error::CoreError;

use threadline_db::DbPool;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    /// Attempts per vote before giving up with a conflict.
    pub vote_retry_attempts: u32,
    /// Worker id embedded in generated snowflake ids.
    pub worker_id: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiry_seconds: 7 * 24 * 3600,
            vote_retry_attempts: vote::DEFAULT_VOTE_ATTEMPTS,
            worker_id: 1,
        }
    }
}
