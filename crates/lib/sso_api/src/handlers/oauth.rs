//! OAuth sign-in handlers for Google and GitHub.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use sso_core::models::Provider;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::services::cookies;

/// Query parameters on the provider callback.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

async fn begin(state: AppState, jar: CookieJar, provider: Provider) -> AppResult<Response> {
    let request = state.federation.begin(provider)?;
    let jar = jar.add(cookies::state_cookie(&request.state, state.config.cookie_secure));
    Ok((jar, Redirect::temporary(&request.url)).into_response())
}

/// The state cookie is cleared whatever the outcome.
async fn callback(
    state: AppState,
    jar: CookieJar,
    provider: Provider,
    params: OAuthCallbackParams,
) -> AppResult<Response> {
    let issued = jar.get(cookies::STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.add(cookies::clear_state_cookie(state.config.cookie_secure));

    let result = state
        .federation
        .complete(
            provider,
            issued.as_deref(),
            params.state.as_deref().unwrap_or_default(),
            params.code.as_deref().unwrap_or_default(),
        )
        .await;

    let session = match result {
        Ok(session) => session,
        Err(e) => return Ok((jar, AppError::from(e)).into_response()),
    };

    let max_age = state.auth.tokens().ttl().num_seconds();
    let jar = jar.add(cookies::session_cookie(
        &session.token,
        max_age,
        state.config.cookie_secure,
    ));
    Ok((
        StatusCode::FOUND,
        jar,
        [(LOCATION, state.config.post_login_redirect.clone())],
    )
        .into_response())
}

/// `GET /auth/google`: redirect to Google's consent page.
pub async fn google_login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Response> {
    begin(state, jar, Provider::Google).await
}

/// `GET /auth/google/callback`
pub async fn google_callback_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<OAuthCallbackParams>,
) -> AppResult<Response> {
    callback(state, jar, Provider::Google, params).await
}

/// `GET /auth/github`: redirect to GitHub's consent page.
pub async fn github_login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Response> {
    begin(state, jar, Provider::GitHub).await
}

/// `GET /auth/github/callback`
pub async fn github_callback_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<OAuthCallbackParams>,
) -> AppResult<Response> {
    callback(state, jar, Provider::GitHub, params).await
}
