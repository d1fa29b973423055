use crate::vote::VoteSets;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub community_id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub votes: VoteSets,
    /// Comment ids in creation order.
    pub comments: Vec<i64>,
}
