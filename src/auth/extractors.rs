use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::jwt::{JwtKeys, TokenKind};
use crate::error::ApiError;

/// Extracts and validates the bearer JWT, rejecting the request with 401
/// when it is missing or invalid.
#[derive(Debug)]
pub struct AuthUser(pub i64);

/// Like [`AuthUser`], but endpoints that are readable anonymously get
/// `None` when no Authorization header is present. A header that is present
/// but invalid is still a 401.
pub struct MaybeUser(pub Option<i64>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
}

fn validate_access<S>(state: &S, token: &str) -> Result<i64, ApiError>
where
    JwtKeys: FromRef<S>,
{
    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;
    if claims.kind != TokenKind::Access {
        return Err(ApiError::Unauthorized("Access token required".into()));
    }
    Ok(claims.sub)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;
        Ok(AuthUser(validate_access(state, token)?))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(MaybeUser(None)),
            Some(token) => Ok(MaybeUser(Some(validate_access(state, token)?))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    use crate::state::AppState;

    fn parts_with_auth(header: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/api/recipes");
        if let Some(h) = header {
            builder = builder.header(axum::http::header::AUTHORIZATION, h);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn auth_user_accepts_valid_access_token() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_access(3).unwrap();
        let mut parts = parts_with_auth(Some(format!("Bearer {token}")));
        let AuthUser(id) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("extract");
        assert_eq!(id, 3);
    }

    #[tokio::test]
    async fn auth_user_rejects_missing_header() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(None);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_user_rejects_refresh_token() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign_refresh(3).unwrap();
        let mut parts = parts_with_auth(Some(format!("Bearer {token}")));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Access token required"));
    }

    #[tokio::test]
    async fn maybe_user_is_none_without_header() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(None);
        let MaybeUser(viewer) = MaybeUser::from_request_parts(&mut parts, &state)
            .await
            .expect("extract");
        assert!(viewer.is_none());
    }

    #[tokio::test]
    async fn maybe_user_still_rejects_garbage_tokens() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Bearer garbage".into()));
        assert!(MaybeUser::from_request_parts(&mut parts, &state)
            .await
            .is_err());
    }
}
