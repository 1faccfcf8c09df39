//! # sso_core
//!
//! Authentication and authorization engine: password and federated sign-in,
//! session tokens, and the admin privilege policy.

pub mod admin;
pub mod auth;
pub mod config;
pub mod federation;
pub mod models;
pub mod policy;
pub mod store;

pub use admin::AdminService;
pub use auth::AuthError;
pub use auth::service::AuthService;
pub use config::SsoConfig;
pub use federation::FederationResolver;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
