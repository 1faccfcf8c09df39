//! # sso_api
//!
//! HTTP API library for the SSO service.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sso_core::auth::jwt::TokenService;
use sso_core::auth::password::PasswordHasher;
use sso_core::store::CredentialStore;
use sso_core::{AdminService, AuthError, AuthService, FederationResolver};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{admin, auth, oauth};
use crate::middleware::auth::{require_auth, require_privileged, require_super_admin};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub federation: FederationResolver,
    pub admin: AdminService,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Wire the services over `store` from `config`.
    pub fn new(store: Arc<dyn CredentialStore>, config: ApiConfig) -> Result<Self, AuthError> {
        let auth = AuthService::new(
            store.clone(),
            PasswordHasher::new(config.sso.bcrypt_cost),
            TokenService::new(config.sso.jwt_secret.as_bytes(), config.sso.token_ttl),
        );
        let federation = FederationResolver::from_config(auth.clone(), &config.sso)?;
        Ok(Self {
            auth,
            federation,
            admin: AdminService::new(store),
            config,
        })
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_AUTH_LOGOUT, post(auth::logout_handler))
        .route(routes::GET_AUTH_GOOGLE, get(oauth::google_login_handler))
        .route(
            routes::GET_AUTH_GOOGLE_CALLBACK,
            get(oauth::google_callback_handler),
        )
        .route(routes::GET_AUTH_GITHUB, get(oauth::github_login_handler))
        .route(
            routes::GET_AUTH_GITHUB_CALLBACK,
            get(oauth::github_callback_handler),
        );

    // Authenticated user routes
    let protected = Router::new()
        .route(
            routes::API_V1_USER,
            get(auth::get_user_handler).put(auth::update_user_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Role-changing admin routes
    let super_admin = Router::new()
        .route(
            routes::POST_ADMIN_USERS_ID_PROMOTE,
            post(admin::promote_user_handler),
        )
        .route(
            routes::POST_ADMIN_USERS_ID_DEMOTE,
            post(admin::demote_user_handler),
        )
        .layer(axum::middleware::from_fn(require_super_admin));

    // Admin console routes
    let admin_console = Router::new()
        .route(routes::GET_ADMIN_STATS, get(admin::stats_handler))
        .route(routes::GET_ADMIN_USERS, get(admin::list_users_handler))
        .route(routes::GET_ADMIN_USERS_RECENT, get(admin::recent_users_handler))
        .route(
            routes::ADMIN_USERS_ID,
            get(admin::get_user_handler)
                .put(admin::update_user_handler)
                .delete(admin::delete_user_handler),
        )
        .route(
            routes::POST_ADMIN_USERS_ID_ACTIVATE,
            post(admin::activate_user_handler),
        )
        .route(
            routes::POST_ADMIN_USERS_ID_DEACTIVATE,
            post(admin::deactivate_user_handler),
        )
        .layer(axum::middleware::from_fn(require_privileged))
        .merge(super_admin)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin_console)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
