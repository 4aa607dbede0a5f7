use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;
use tracing::warn;
use uuid::Uuid;

use crate::{auth::jwt::JwtKeys, error::AppError};

/// Name of the cookie set on signin.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

pub const MISSING_TOKEN: &str = "Unauthorized: token is expired or missing";
pub const INVALID_TOKEN: &str = "Invalid token";

/// Verified caller identity taken from the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub is_admin: bool,
}

/// The `Authorization: Bearer` header wins; the signin cookie is the fallback.
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized(MISSING_TOKEN.into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|e| {
            warn!(error = %e, "token rejected");
            AppError::Forbidden(INVALID_TOKEN.into())
        })?;

        Ok(AuthUser {
            id: claims.sub,
            is_admin: claims.is_admin,
        })
    }
}
