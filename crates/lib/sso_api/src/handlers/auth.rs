//! Password authentication and self-service profile handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use sso_core::models::{IdentityView, LoginRequest, ProfileUpdate, RegisterRequest, Session};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::cookies;

/// Token plus the identity it was issued for.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: IdentityView,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: IdentityView,
}

/// Attach the session cookie and build the JSON body.
pub(crate) fn session_reply(
    state: &AppState,
    jar: CookieJar,
    session: Session,
) -> (CookieJar, Json<SessionResponse>) {
    let expires_in = state.auth.tokens().ttl().num_seconds();
    let jar = jar.add(cookies::session_cookie(
        &session.token,
        expires_in,
        state.config.cookie_secure,
    ));
    let body = SessionResponse {
        token: session.token,
        token_type: "Bearer",
        expires_in,
        user: session.identity.to_view(),
    };
    (jar, Json(body))
}

/// `POST /auth/register`: create a password account and sign in.
pub async fn register_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<SessionResponse>)> {
    let session = state.auth.register(body).await?;
    let (jar, body) = session_reply(&state, jar, session);
    Ok((StatusCode::CREATED, jar, body))
}

/// `POST /auth/login`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let session = state.auth.login(body).await?;
    Ok(session_reply(&state, jar, session))
}

/// `POST /auth/logout`: clear the session cookie. Tokens are stateless, so
/// a copied token stays valid until it expires.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.add(cookies::clear_session_cookie(state.config.cookie_secure));
    (
        jar,
        Json(MessageResponse {
            message: "Logout successful".into(),
        }),
    )
}

/// `GET /api/v1/user`: the authenticated identity.
pub async fn get_user_handler(
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<UserResponse> {
    Json(UserResponse {
        user: user.0.to_view(),
    })
}

/// `PUT /api/v1/user`: edit the authenticated identity's profile.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<ProfileUpdate>,
) -> AppResult<Json<UserResponse>> {
    let updated = state.auth.update_profile(user.0.id, body).await?;
    Ok(Json(UserResponse {
        user: updated.to_view(),
    }))
}
