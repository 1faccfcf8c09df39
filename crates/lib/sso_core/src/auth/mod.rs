//! Authentication logic.
//!
//! Password hashing, session tokens, and the login/registration service that
//! ties them to the credential store.

pub mod jwt;
pub mod password;
pub mod secret;
pub mod service;

use thiserror::Error;

use crate::models::Provider;
use crate::policy::Denial;
use crate::store::StoreError;

/// Errors surfaced by the authentication and authorization engine.
///
/// Messages never include password hashes, signing keys, or provider secrets.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email, passwordless account, or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserExists,

    #[error("User not found")]
    UserNotFound,

    /// Bad signature, unexpected algorithm, malformed claims, expired, or an
    /// unknown subject.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Account is deactivated")]
    AccountInactive,

    #[error("Invalid OAuth state")]
    InvalidState,

    #[error("OAuth provider not configured: {0}")]
    ProviderNotConfigured(Provider),

    #[error("Federation code exchange failed: {0}")]
    FederationExchangeFailed(String),

    #[error("Federation profile unavailable: {0}")]
    FederationProfileUnavailable(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(Denial),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(_) => AuthError::UserExists,
            StoreError::NotFound => AuthError::UserNotFound,
            other => AuthError::Store(other),
        }
    }
}

impl From<Denial> for AuthError {
    fn from(d: Denial) -> Self {
        AuthError::NotAuthorized(d)
    }
}
