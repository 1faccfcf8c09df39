//! Admin console API handlers.
//!
//! Route-level middleware admits privileged identities only; the finer
//! policy decisions are made by `AdminService`.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use sso_core::admin::DEFAULT_PAGE_LIMIT;
use sso_core::models::{AdminUpdate, IdentityStats, IdentityView};

use crate::AppState;
use crate::error::AppResult;
use crate::handlers::auth::{MessageResponse, UserResponse};
use crate::middleware::auth::AuthenticatedUser;

/// Listing filters. `search` wins over `role`; `page` is 1-based.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    #[serde(default)]
    pub days: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersResponse {
    pub users: Vec<IdentityView>,
    pub page: i64,
    pub limit: i64,
}

/// `GET /admin/api/stats`
pub async fn stats_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
) -> AppResult<Json<IdentityStats>> {
    Ok(Json(state.admin.stats(&actor.0).await?))
}

/// `GET /admin/api/users?page=&limit=&role=&search=`
pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Query(query): Query<UsersQuery>,
) -> AppResult<Json<UsersResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = sso_core::admin::clamp_limit(query.limit.unwrap_or(DEFAULT_PAGE_LIMIT));
    let offset = (page - 1).saturating_mul(limit);

    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let role = query.role.as_deref().filter(|r| !r.is_empty());
    let users = match (search, role) {
        (Some(q), _) => state.admin.search_users(&actor.0, q, limit, offset).await?,
        (None, Some(role)) => {
            state
                .admin
                .users_by_role(&actor.0, role, limit, offset)
                .await?
        }
        (None, None) => state.admin.list_users(&actor.0, limit, offset).await?,
    };

    Ok(Json(UsersResponse {
        users: users.iter().map(|u| u.to_view()).collect(),
        page,
        limit,
    }))
}

/// `GET /admin/api/users/recent?days=&limit=`
pub async fn recent_users_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<UsersResponse>> {
    let limit = sso_core::admin::clamp_limit(query.limit.unwrap_or(DEFAULT_PAGE_LIMIT));
    let users = state
        .admin
        .recent_users(&actor.0, query.days.unwrap_or(7), limit, 0)
        .await?;
    Ok(Json(UsersResponse {
        users: users.iter().map(|u| u.to_view()).collect(),
        page: 1,
        limit,
    }))
}

/// `GET /admin/api/users/{id}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state.admin.user(&actor.0, id).await?;
    Ok(Json(UserResponse {
        user: user.to_view(),
    }))
}

/// `PUT /admin/api/users/{id}`
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<AdminUpdate>,
) -> AppResult<Json<UserResponse>> {
    let user = state.admin.update_user(&actor.0, id, body).await?;
    Ok(Json(UserResponse {
        user: user.to_view(),
    }))
}

/// `DELETE /admin/api/users/{id}`
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    state.admin.delete_user(&actor.0, id).await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully".into(),
    }))
}

/// `POST /admin/api/users/{id}/activate`
pub async fn activate_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state.admin.activate_user(&actor.0, id).await?;
    Ok(Json(UserResponse {
        user: user.to_view(),
    }))
}

/// `POST /admin/api/users/{id}/deactivate`
pub async fn deactivate_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state.admin.deactivate_user(&actor.0, id).await?;
    Ok(Json(UserResponse {
        user: user.to_view(),
    }))
}

/// `POST /admin/api/users/{id}/promote`
pub async fn promote_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state.admin.promote_to_admin(&actor.0, id).await?;
    Ok(Json(UserResponse {
        user: user.to_view(),
    }))
}

/// `POST /admin/api/users/{id}/demote`
pub async fn demote_user_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state.admin.demote_from_admin(&actor.0, id).await?;
    Ok(Json(UserResponse {
        user: user.to_view(),
    }))
}
