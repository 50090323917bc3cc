use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::jwt::{TokenError, TokenService};
use crate::{error::AppError, store::UserId};

/// Why a request was not authenticated. Logged, never sent to the client.
#[derive(Debug)]
pub enum AuthRejection {
    MissingHeader,
    EmptyCredential,
    InvalidToken(TokenError),
}

/// Verify the request's `Authorization` header and return the caller's id.
///
/// The header carries the raw token, optionally prefixed with `Bearer `.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<UserId, AuthRejection> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthRejection::MissingHeader)?;

    let token = strip_bearer(value.trim());
    if token.is_empty() {
        return Err(AuthRejection::EmptyCredential);
    }

    tokens.validate(token).map_err(AuthRejection::InvalidToken)
}

fn strip_bearer(value: &str) -> &str {
    const SCHEME: &str = "bearer";
    match (value.get(..SCHEME.len()), value.get(SCHEME.len()..)) {
        (Some(scheme), Some(rest))
            if scheme.eq_ignore_ascii_case(SCHEME) && (rest.is_empty() || rest.starts_with(' ')) =>
        {
            rest.trim_start()
        }
        _ => value,
    }
}

/// Verified identity of the caller. Handlers that take this argument only
/// run for requests carrying a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenService::from_ref(state);
        match authenticate(&parts.headers, &tokens) {
            Ok(user_id) => Ok(AuthUser(user_id)),
            Err(reason) => {
                warn!(?reason, uri = %parts.uri, "request rejected: unauthenticated");
                Err(AppError::Unauthorized)
            }
        }
    }
}
