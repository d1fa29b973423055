use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use threadline_core::AppState;
use threadline_models::engagement::MyVotes;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::routes::parse_id_list;

#[derive(Deserialize)]
pub struct MyVotesQuery {
    pub post_ids: Option<String>,
    pub comment_ids: Option<String>,
}

/// Standing votes of the caller, optionally narrowed to the listed ids.
pub async fn get_my_votes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<MyVotesQuery>,
) -> Result<Json<MyVotes>, ApiError> {
    let post_ids = params.post_ids.as_deref().map(parse_id_list).transpose()?;
    let comment_ids = params
        .comment_ids
        .as_deref()
        .map(parse_id_list)
        .transpose()?;

    let votes = threadline_core::vote::get_user_votes(
        &state.db,
        auth.user_id,
        post_ids.as_deref(),
        comment_ids.as_deref(),
    )
    .await?;
    Ok(Json(votes))
}
