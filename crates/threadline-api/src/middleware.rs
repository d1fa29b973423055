use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use threadline_core::AppState;

use crate::error::ApiError;

/// Caller identified by a valid bearer token.
pub struct AuthUser {
    pub user_id: i64,
}

/// Caller on read routes where signing in is optional. A token that is
/// present but invalid is still rejected.
pub struct Viewer {
    pub user_id: Option<i64>,
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(raw) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let raw = raw.to_str().map_err(|_| ApiError::Unauthorized)?;
    raw.strip_prefix("Bearer ")
        .map(Some)
        .ok_or(ApiError::Unauthorized)
}

fn validate_auth(token: &str, state: &AppState) -> Result<i64, ApiError> {
    let claims = threadline_core::auth::validate_token(token, &state.config.jwt_secret)
        .map_err(|e| {
            tracing::debug!("rejected bearer token: {e}");
            ApiError::Unauthorized
        })?;
    if claims.sub <= 0 {
        return Err(ApiError::Unauthorized);
    }
    Ok(claims.sub)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or(ApiError::Unauthorized)?;
        let user_id = validate_auth(token, state)?;
        Ok(AuthUser { user_id })
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = match bearer_token(parts)? {
            Some(token) => Some(validate_auth(token, state)?),
            None => None,
        };
        Ok(Viewer { user_id })
    }
}
