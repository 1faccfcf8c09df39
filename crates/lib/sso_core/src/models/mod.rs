//! Domain models.
//!
//! Internal domain types shared by the core services, the HTTP layer and the
//! CLI.

pub mod auth;
pub mod identity;

pub use auth::{AdminUpdate, LoginRequest, ProfileUpdate, RegisterRequest, Session, SessionClaims};
pub use identity::{Identity, IdentityStats, IdentityView, NewIdentity, Provider, Role};
