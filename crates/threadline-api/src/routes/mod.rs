pub mod comments;
pub mod health;
pub mod polls;
pub mod posts;
pub mod users;

use serde_json::{json, Value};
use threadline_models::{Comment, Post, VoteSets};

use crate::error::ApiError;

fn vote_fields(votes: &VoteSets, viewer_id: Option<i64>) -> (i64, i64, i64, Value) {
    let my_vote = match viewer_id.map(|id| votes.direction_of(id)) {
        Some(direction) if direction.is_cast() => json!(direction.as_str()),
        _ => Value::Null,
    };
    (
        votes.upvote_count(),
        votes.downvote_count(),
        votes.score(),
        my_vote,
    )
}

pub(crate) fn post_to_json(post: &Post, viewer_id: Option<i64>) -> Value {
    let (upvote_count, downvote_count, score, my_vote) = vote_fields(&post.votes, viewer_id);
    json!({
        "id": post.id.to_string(),
        "author_id": post.author_id.to_string(),
        "community_id": post.community_id.to_string(),
        "title": post.title,
        "body": post.body,
        "created_at": post.created_at.to_rfc3339(),
        "upvote_count": upvote_count,
        "downvote_count": downvote_count,
        "score": score,
        "my_vote": my_vote,
        "comment_ids": post.comments.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
    })
}

pub(crate) fn comment_to_json(comment: &Comment, viewer_id: Option<i64>) -> Value {
    let (upvote_count, downvote_count, score, my_vote) = vote_fields(&comment.votes, viewer_id);
    json!({
        "id": comment.id.to_string(),
        "post_id": comment.post_id.to_string(),
        "parent_comment_id": comment.parent_comment_id.map(|id| id.to_string()),
        "author_id": comment.author_id.to_string(),
        "body": comment.body,
        "created_at": comment.created_at.to_rfc3339(),
        "upvote_count": upvote_count,
        "downvote_count": downvote_count,
        "vote_count": score,
        "my_vote": my_vote,
        "replies": comment
            .replies
            .iter()
            .map(|reply| comment_to_json(reply, viewer_id))
            .collect::<Vec<_>>(),
    })
}

/// Parse a comma separated list of ids from a query string.
pub(crate) fn parse_id_list(raw: &str) -> Result<Vec<i64>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("invalid id: {part}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_lists_skip_blanks_and_reject_garbage() {
        assert_eq!(parse_id_list("1, 2,,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_id_list("").unwrap().is_empty());
        assert!(matches!(parse_id_list("1,x"), Err(ApiError::BadRequest(_))));
    }
}
