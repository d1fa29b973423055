use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use threadline_core::CoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    #[error("you have already voted on this poll")]
    AlreadyVoted,
    #[error("this poll has expired")]
    PollExpired,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Machine-readable error code string.
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidSelection(_) => "INVALID_SELECTION",
            ApiError::AlreadyVoted => "ALREADY_VOTED",
            ApiError::PollExpired => "POLL_EXPIRED",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) | ApiError::InvalidSelection(_) => StatusCode::BAD_REQUEST,
            ApiError::AlreadyVoted | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PollExpired => StatusCode::GONE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let message = match &self {
            ApiError::Internal(err) => {
                tracing::error!("API internal error: {err:#}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "code": code,
            "message": message,
            "error": message,
            "details": Value::Null,
        });

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NotFound => ApiError::NotFound,
            CoreError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            CoreError::InvalidSelection(msg) => ApiError::InvalidSelection(msg),
            CoreError::AlreadyVoted => ApiError::AlreadyVoted,
            CoreError::PollExpired => ApiError::PollExpired,
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
            CoreError::Database(err) => {
                ApiError::Internal(anyhow::anyhow!("database error: {err}"))
            }
            CoreError::Internal(msg) => ApiError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<threadline_db::DbError> for ApiError {
    fn from(e: threadline_db::DbError) -> Self {
        ApiError::from(CoreError::from(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_rejections_map_to_distinct_statuses() {
        assert_eq!(
            ApiError::from(CoreError::PollExpired).status_code(),
            StatusCode::GONE
        );
        assert_eq!(
            ApiError::from(CoreError::AlreadyVoted).error_code(),
            "ALREADY_VOTED"
        );
        let selection = ApiError::from(CoreError::InvalidSelection("x".into()));
        assert_eq!(selection.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(selection.error_code(), "INVALID_SELECTION");
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = ApiError::from(CoreError::Internal("disk on fire".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "internal server error");
        assert!(matches!(
            ApiError::from(threadline_db::DbError::NotFound),
            ApiError::NotFound
        ));
    }
}
