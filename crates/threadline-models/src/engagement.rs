//! Request and response bodies shared by the HTTP service and its client.

use crate::poll::PollType;
use crate::vote::VoteDirection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub direction: VoteDirection,
}

/// Authoritative counts after a vote was applied. A cleared vote has no
/// `direction` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub upvote_count: i64,
    pub downvote_count: i64,
    #[serde(default, skip_serializing_if = "VoteDirection::is_none")]
    pub direction: VoteDirection,
}

/// A user's standing votes, keyed by entity id. Entities without a vote are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MyVotes {
    #[serde(default)]
    pub posts: BTreeMap<i64, VoteDirection>,
    #[serde(default)]
    pub comments: BTreeMap<i64, VoteDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(with = "crate::id_str")]
    pub post_id: i64,
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotRequest {
    pub option_indexes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostRequest {
    #[serde(with = "crate::id_str")]
    pub community_id: i64,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default, with = "crate::opt_id_str")]
    pub parent_comment_id: Option<i64>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePollRequest {
    #[serde(with = "crate::id_str")]
    pub community_id: i64,
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub allow_multiple_votes: bool,
    #[serde(default)]
    pub poll_type: PollType,
    #[serde(default)]
    pub correct_option_indexes: Vec<usize>,
    #[serde(default)]
    pub show_correct_option: bool,
    pub expires_at: DateTime<Utc>,
}
