use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use threadline_core::AppState;
use threadline_db::votes::VoteTarget;
use threadline_models::engagement::{CreatePostRequest, SaveResponse, VoteRequest, VoteResponse};

use crate::error::ApiError;
use crate::middleware::{AuthUser, Viewer};
use crate::routes::post_to_json;

pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let post_id = threadline_util::snowflake::generate(state.config.worker_id);
    let post = threadline_core::post::create_post(&state.db, post_id, auth.user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(post_to_json(&post, Some(auth.user_id)))))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    viewer: Viewer,
) -> Result<Json<Value>, ApiError> {
    let post = threadline_core::post::get_post(&state.db, post_id).await?;
    Ok(Json(post_to_json(&post, viewer.user_id)))
}

pub async fn vote_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    auth: AuthUser,
    Json(body): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let tally = threadline_core::vote::cast_vote(
        &state.db,
        VoteTarget::Post,
        post_id,
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

pub async fn toggle_save(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    auth: AuthUser,
) -> Result<Json<SaveResponse>, ApiError> {
    let saved = threadline_core::saved::toggle_saved(&state.db, auth.user_id, post_id).await?;
    Ok(Json(SaveResponse { post_id, saved }))
}

pub async fn list_saved(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let ids = threadline_core::saved::list_saved(&state.db, auth.user_id).await?;
    Ok(Json(json!(ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>())))
}
