use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use threadline_core::AppState;
use threadline_models::engagement::{BallotRequest, CreatePollRequest};
use threadline_models::PollView;

use crate::error::ApiError;
use crate::middleware::{AuthUser, Viewer};

pub async fn create_poll(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreatePollRequest>,
) -> Result<(StatusCode, Json<PollView>), ApiError> {
    let now = Utc::now();
    let poll_id = threadline_util::snowflake::generate(state.config.worker_id);
    let poll =
        threadline_core::poll::create_poll(&state.db, poll_id, auth.user_id, &body, now).await?;
    Ok((
        StatusCode::CREATED,
        Json(poll.view_for(Some(auth.user_id), now)),
    ))
}

pub async fn get_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<i64>,
    viewer: Viewer,
) -> Result<Json<PollView>, ApiError> {
    let now = Utc::now();
    let poll = threadline_core::poll::get_poll(&state.db, poll_id, now).await?;
    Ok(Json(poll.view_for(viewer.user_id, now)))
}

pub async fn cast_ballot(
    State(state): State<AppState>,
    Path(poll_id): Path<i64>,
    auth: AuthUser,
    Json(body): Json<BallotRequest>,
) -> Result<Json<PollView>, ApiError> {
    let now = Utc::now();
    let poll = threadline_core::poll::submit_ballot(
        &state.db,
        poll_id,
        auth.user_id,
        &body.option_indexes,
        now,
    )
    .await?;
    Ok(Json(poll.view_for(Some(auth.user_id), now)))
}
