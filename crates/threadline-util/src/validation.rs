use thiserror::Error;

pub const MAX_POST_TITLE_LEN: usize = 300;
pub const MAX_POST_BODY_LEN: usize = 40_000;
pub const MAX_COMMENT_LEN: usize = 10_000;
pub const MAX_POLL_QUESTION_LEN: usize = 300;
pub const MAX_POLL_OPTION_LEN: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Trimmed text must be non-empty and at most `max` characters.
pub fn validate_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

pub fn validate_comment_body(body: &str) -> Result<(), ValidationError> {
    validate_text("comment body", body, MAX_COMMENT_LEN)
}

pub fn validate_post_title(title: &str) -> Result<(), ValidationError> {
    validate_text("post title", title, MAX_POST_TITLE_LEN)
}

/// Post bodies may be empty (link or title-only posts).
pub fn validate_post_body(body: &str) -> Result<(), ValidationError> {
    if body.chars().count() > MAX_POST_BODY_LEN {
        return Err(ValidationError::TooLong {
            field: "post body",
            max: MAX_POST_BODY_LEN,
        });
    }
    Ok(())
}
