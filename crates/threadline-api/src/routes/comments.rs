use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use threadline_core::AppState;
use threadline_db::votes::VoteTarget;
use threadline_models::engagement::{CreateCommentRequest, VoteRequest, VoteResponse};

use crate::error::ApiError;
use crate::middleware::{AuthUser, Viewer};
use crate::routes::comment_to_json;

pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    auth: AuthUser,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let comment_id = threadline_util::snowflake::generate(state.config.worker_id);
    let comment = threadline_core::comment::create_comment(
        &state.db,
        comment_id,
        post_id,
        body.parent_comment_id,
        auth.user_id,
        &body.body,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(comment_to_json(&comment, Some(auth.user_id))),
    ))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    viewer: Viewer,
) -> Result<Json<Value>, ApiError> {
    let tree = threadline_core::comment::list_post_comments(&state.db, post_id).await?;
    Ok(Json(Value::Array(
        tree.iter()
            .map(|comment| comment_to_json(comment, viewer.user_id))
            .collect(),
    )))
}

pub async fn vote_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<i64>,
    auth: AuthUser,
    Json(body): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let tally = threadline_core::vote::cast_vote(
        &state.db,
        VoteTarget::Comment,
        comment_id,
        auth.user_id,
        body.direction,
        state.config.vote_retry_attempts,
    )
    .await?;
    Ok(Json(VoteResponse {
        upvote_count: tally.upvote_count,
        downvote_count: tally.downvote_count,
        direction: tally.effective_direction,
    }))
}
