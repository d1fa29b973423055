use crate::vote::VoteSets;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    /// `None` for top-level comments.
    pub parent_comment_id: Option<i64>,
    pub author_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub votes: VoteSets,
    /// Only populated by tree construction; flat reads leave this empty.
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn vote_count(&self) -> i64 {
        self.votes.score()
    }
}
