use crate::comment_tree::build_tree;
use crate::error::{ensure_user, CoreError};
use threadline_db::comments::CommentRow;
use threadline_db::DbPool;
use threadline_models::{Comment, VoteSets};
use threadline_util::validation::validate_comment_body;

fn assemble(row: CommentRow, votes: VoteSets) -> Comment {
    Comment {
        id: row.id,
        post_id: row.post_id,
        parent_comment_id: row.parent_comment_id,
        author_id: row.author_id,
        body: row.body,
        created_at: row.created_at,
        votes,
        replies: Vec::new(),
    }
}

/// Add a comment to a post, optionally as a reply. The parent must exist and
/// belong to the same post.
pub async fn create_comment(
    pool: &DbPool,
    comment_id: i64,
    post_id: i64,
    parent_comment_id: Option<i64>,
    author_id: i64,
    body: &str,
) -> Result<Comment, CoreError> {
    ensure_user(author_id)?;
    validate_comment_body(body)?;

    if !threadline_db::posts::post_exists(pool, post_id).await? {
        return Err(CoreError::NotFound);
    }
    if let Some(parent_id) = parent_comment_id {
        let parent = threadline_db::comments::get_comment(pool, parent_id)
            .await?
            .ok_or(CoreError::NotFound)?;
        if parent.post_id != post_id {
            return Err(CoreError::InvalidRequest(
                "parent comment belongs to a different post".into(),
            ));
        }
    }

    let row = threadline_db::comments::create_comment(
        pool,
        comment_id,
        post_id,
        parent_comment_id,
        author_id,
        body.trim(),
    )
    .await?;
    tracing::debug!(comment_id, post_id, parent = ?parent_comment_id, "comment created");
    Ok(assemble(row, VoteSets::new()))
}

/// Every comment on a post, nested into reply trees.
pub async fn list_post_comments(pool: &DbPool, post_id: i64) -> Result<Vec<Comment>, CoreError> {
    if !threadline_db::posts::post_exists(pool, post_id).await? {
        return Err(CoreError::NotFound);
    }

    let rows = threadline_db::comments::get_post_comments(pool, post_id).await?;
    let mut votes = threadline_db::votes::load_comment_vote_sets_for_post(pool, post_id).await?;
    let flat = rows
        .into_iter()
        .map(|row| {
            let sets = votes.remove(&row.id).unwrap_or_default();
            assemble(row, sets)
        })
        .collect();
    Ok(build_tree(flat))
}
