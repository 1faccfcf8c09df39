//! Login, registration and session authentication over a credential store.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::AuthError;
use super::jwt::TokenService;
use super::password::PasswordHasher;
use crate::models::auth::non_empty;
use crate::models::identity::normalize_email;
use crate::models::{
    Identity, LoginRequest, NewIdentity, ProfileUpdate, RegisterRequest, Role, Session,
};
use crate::store::CredentialStore;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum length for first and last names.
pub const MIN_NAME_LEN: usize = 2;

/// Password and session authentication.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Issue a session token for an already-resolved identity.
    pub fn issue_session(&self, identity: Identity) -> Result<Session, AuthError> {
        let token = self.tokens.issue(&identity)?;
        Ok(Session { token, identity })
    }

    /// Validate `token` and load its subject.
    ///
    /// The subject must still exist and be active: deactivation takes effect
    /// on the next request even though the token itself is unexpired.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.tokens.validate(token)?;
        let Some(identity) = self.store.get_by_id(claims.user_id).await? else {
            debug!(user_id = claims.user_id, "token subject no longer exists");
            return Err(AuthError::InvalidToken);
        };
        if !identity.is_active {
            return Err(AuthError::AccountInactive);
        }
        Ok(identity)
    }

    // -----------------------------------------------------------------------
    // Password flows
    // -----------------------------------------------------------------------

    /// Create a password identity and sign it in.
    pub async fn register(&self, req: RegisterRequest) -> Result<Session, AuthError> {
        let email = normalize_email(&req.email);
        validate_email(&email)?;
        if req.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let first_name = validate_name("First name", &req.first_name)?;
        let last_name = validate_name("Last name", &req.last_name)?;

        if self.store.get_by_email(&email).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let password_hash = self.hasher.hash(&req.password)?;
        let identity = self
            .store
            .create(NewIdentity {
                email,
                password_hash: Some(password_hash),
                first_name,
                last_name,
                is_active: true,
                is_verified: false,
                role: Role::User,
                ..Default::default()
            })
            .await?;

        info!(user_id = identity.id, "registered new identity");
        self.issue_session(identity)
    }

    /// Verify email and password, stamp the login time, and sign in.
    ///
    /// Unknown email, passwordless accounts and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn login(&self, req: LoginRequest) -> Result<Session, AuthError> {
        let email = normalize_email(&req.email);
        let Some(mut identity) = self.store.get_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        let Some(hash) = identity.password_hash.as_deref() else {
            return Err(AuthError::InvalidCredentials);
        };
        if !self.hasher.verify(hash, &req.password) {
            return Err(AuthError::InvalidCredentials);
        }
        if !identity.is_active {
            return Err(AuthError::AccountInactive);
        }

        identity.last_login_at = Some(Utc::now());
        let identity = self.store.update(&identity).await?;

        info!(user_id = identity.id, "password login");
        self.issue_session(identity)
    }

    // -----------------------------------------------------------------------
    // Profile
    // -----------------------------------------------------------------------

    pub async fn identity(&self, id: i64) -> Result<Identity, AuthError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Self-service profile edit. Role, flags and email are not touched.
    pub async fn update_profile(
        &self,
        id: i64,
        update: ProfileUpdate,
    ) -> Result<Identity, AuthError> {
        let mut identity = self.identity(id).await?;
        identity.first_name = validate_name("First name", &update.first_name)?;
        identity.last_name = validate_name("Last name", &update.last_name)?;
        identity.bio = non_empty(update.bio);
        identity.website = non_empty(update.website);
        identity.location = non_empty(update.location);
        let identity = self.store.update(&identity).await?;
        info!(user_id = identity.id, "profile updated");
        Ok(identity)
    }
}

/// Minimal structural email check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    let invalid = || AuthError::Validation("Invalid email address".into());
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

fn validate_name(field: &str, value: &str) -> Result<String, AuthError> {
    let trimmed = value.trim();
    if trimmed.chars().count() < MIN_NAME_LEN {
        return Err(AuthError::Validation(format!(
            "{field} must be at least {MIN_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}
