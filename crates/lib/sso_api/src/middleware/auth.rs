//! Authentication middleware: session token extraction and privilege gates.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use sso_core::models::Identity;
use sso_core::policy::{Denial, is_privileged, is_super_admin};

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::SESSION_COOKIE;

/// The live identity behind the request's session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

/// Session token from `Authorization: Bearer …`, else the `jwt` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Axum middleware: validates the session token against the live identity
/// and injects [`AuthenticatedUser`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Missing session token".into()))?;

    let identity = state.auth.authenticate(&token).await?;

    request.extensions_mut().insert(AuthenticatedUser(identity));
    Ok(next.run(request).await)
}

fn current_user(request: &Request) -> Result<&Identity, AppError> {
    request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| &u.0)
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))
}

/// Gate for admin console routes. Must run after [`require_auth`].
pub async fn require_privileged(request: Request, next: Next) -> Result<Response, AppError> {
    if !is_privileged(current_user(&request)?) {
        return Err(AppError::Forbidden(Denial::NotPrivileged.to_string()));
    }
    Ok(next.run(request).await)
}

/// Gate for promote/demote routes. Must run after [`require_auth`].
pub async fn require_super_admin(request: Request, next: Next) -> Result<Response, AppError> {
    if !is_super_admin(current_user(&request)?) {
        return Err(AppError::Forbidden(Denial::NotSuperAdmin.to_string()));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;

    use super::*;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(COOKIE, HeaderValue::from_static("jwt=from-cookie"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn cookie_is_used_without_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        headers.insert(COOKIE, HeaderValue::from_static("other=1; jwt=from-cookie"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn no_token_anywhere() {
        assert!(extract_token(&HeaderMap::new()).is_none());
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("jwt="));
        assert!(extract_token(&headers).is_none());
    }
}
