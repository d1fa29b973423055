use crate::error::{ensure_user, CoreError};
use threadline_db::posts::PostRow;
use threadline_db::votes::VoteTarget;
use threadline_db::DbPool;
use threadline_models::engagement::CreatePostRequest;
use threadline_models::{Post, VoteSets};
use threadline_util::validation::{validate_post_body, validate_post_title};

fn assemble(row: PostRow, votes: VoteSets, comments: Vec<i64>) -> Post {
    Post {
        id: row.id,
        author_id: row.author_id,
        community_id: row.community_id,
        title: row.title,
        body: row.body,
        created_at: row.created_at,
        votes,
        comments,
    }
}

pub async fn create_post(
    pool: &DbPool,
    post_id: i64,
    author_id: i64,
    req: &CreatePostRequest,
) -> Result<Post, CoreError> {
    ensure_user(author_id)?;
    validate_post_title(&req.title)?;
    validate_post_body(&req.body)?;

    let row = threadline_db::posts::create_post(
        pool,
        post_id,
        author_id,
        req.community_id,
        req.title.trim(),
        req.body.trim(),
    )
    .await?;
    tracing::info!(post_id, author_id, community_id = req.community_id, "post created");
    Ok(assemble(row, VoteSets::new(), Vec::new()))
}

/// A post with its vote sets and comment ids.
pub async fn get_post(pool: &DbPool, post_id: i64) -> Result<Post, CoreError> {
    let row = threadline_db::posts::get_post(pool, post_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    let votes = threadline_db::votes::load_vote_sets(pool, VoteTarget::Post, post_id).await?;
    let comments = threadline_db::comments::get_post_comment_ids(pool, post_id).await?;
    Ok(assemble(row, votes, comments))
}
