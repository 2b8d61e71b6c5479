use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenKind};
use crate::error::AppError;

/// Extracts and validates the bearer access token, returning the user ID.
pub struct AuthUser(pub Uuid);

/// Like [`AuthUser`] but yields `None` when no Authorization header is sent.
/// A header that is present but invalid is still rejected.
pub struct OptionalAuthUser(pub Option<Uuid>);

fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let header = parts.headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()));
    Some(token)
}

fn user_from_token(keys: &JwtKeys, token: &str) -> Result<Uuid, AppError> {
    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;
    if claims.kind != TokenKind::Access {
        return Err(AppError::Unauthorized("Access token required".into()));
    }
    Ok(claims.sub)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))??;
        Ok(AuthUser(user_from_token(&keys, token)?))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(OptionalAuthUser(None));
        };
        let keys = JwtKeys::from_ref(state);
        Ok(OptionalAuthUser(Some(user_from_token(&keys, token?)?)))
    }
}
