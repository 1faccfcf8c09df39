//! Identity federation: OAuth2 sign-in through external providers.
//!
//! Flow: initiate ([`FederationResolver::begin`]) → verify the echoed state
//! → exchange the code → fetch the profile → resolve or create the local
//! identity → issue a session token. Any failure ends the flow; nothing is
//! retried.

pub mod client;
pub mod github;
pub mod google;
pub mod state;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::auth::AuthError;
use crate::auth::service::AuthService;
use crate::config::SsoConfig;
use crate::models::{Identity, NewIdentity, Provider, Role, Session};
use crate::store::StoreError;

pub use github::GitHubProvider;
pub use google::GoogleProvider;
pub use state::{generate_state, verify_state};

/// Normalized profile returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider: Provider,
    /// Provider-assigned account id.
    pub subject: String,
    /// Normalized email; empty when the provider disclosed none.
    pub email: String,
    pub email_verified: bool,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

/// An external OAuth2 identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Consent-page URL embedding `state`.
    fn authorization_url(&self, state: &str) -> Result<String, AuthError>;

    /// Trade an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String, AuthError>;

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, AuthError>;
}

/// Redirect target and the state value the caller must remember.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Maps provider accounts onto local identities.
#[derive(Clone)]
pub struct FederationResolver {
    auth: AuthService,
    providers: HashMap<Provider, Arc<dyn IdentityProvider>>,
}

impl FederationResolver {
    /// Resolver with no providers enabled.
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth,
            providers: HashMap::new(),
        }
    }

    /// Resolver with every provider `config` has credentials for.
    pub fn from_config(auth: AuthService, config: &SsoConfig) -> Result<Self, AuthError> {
        let http = client::http_client(config.oauth_http_timeout)?;
        let mut resolver = Self::new(auth);
        for provider in [Provider::Google, Provider::GitHub] {
            let Some(settings) = config.provider(provider).cloned() else {
                continue;
            };
            let client: Arc<dyn IdentityProvider> = match provider {
                Provider::Google => Arc::new(GoogleProvider::new(http.clone(), settings)),
                Provider::GitHub => Arc::new(GitHubProvider::new(http.clone(), settings)),
            };
            resolver = resolver.with_provider(client);
        }
        Ok(resolver)
    }

    pub fn with_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.providers.insert(provider.provider(), provider);
        self
    }

    pub fn is_enabled(&self, provider: Provider) -> bool {
        self.providers.contains_key(&provider)
    }

    fn provider(&self, provider: Provider) -> Result<&Arc<dyn IdentityProvider>, AuthError> {
        self.providers
            .get(&provider)
            .ok_or(AuthError::ProviderNotConfigured(provider))
    }

    /// Start a sign-in: fresh state plus the provider's consent URL.
    pub fn begin(&self, provider: Provider) -> Result<AuthorizationRequest, AuthError> {
        let idp = self.provider(provider)?;
        let state = generate_state();
        let url = idp.authorization_url(&state)?;
        Ok(AuthorizationRequest { url, state })
    }

    /// Finish a sign-in from the provider callback.
    ///
    /// `issued_state` is the value remembered at [`begin`](Self::begin);
    /// a mismatch fails before any network or store access.
    pub async fn complete(
        &self,
        provider: Provider,
        issued_state: Option<&str>,
        supplied_state: &str,
        code: &str,
    ) -> Result<Session, AuthError> {
        verify_state(issued_state, supplied_state)?;
        let idp = self.provider(provider)?;
        if code.trim().is_empty() {
            return Err(AuthError::Validation("Missing authorization code".into()));
        }

        let access_token = idp.exchange_code(code).await.inspect_err(|e| {
            debug!(%provider, error = %e, "code exchange failed");
        })?;
        let profile = idp.fetch_profile(&access_token).await.inspect_err(|e| {
            debug!(%provider, error = %e, "profile fetch failed");
        })?;

        let identity = self.resolve_identity(&profile).await?;
        if !identity.is_active {
            return Err(AuthError::AccountInactive);
        }

        info!(user_id = identity.id, %provider, "federated login");
        self.auth.issue_session(identity)
    }

    /// Find the local identity for `profile`, linking or creating as needed.
    ///
    /// A uniqueness conflict on create means a concurrent first login won
    /// the race; the lookup is repeated once and the winner returned.
    pub async fn resolve_identity(&self, profile: &ProviderProfile) -> Result<Identity, AuthError> {
        if let Some(identity) = self.lookup(profile).await? {
            return Ok(identity);
        }

        let store = self.auth.store();
        match store.create(new_identity(profile)).await {
            Ok(identity) => {
                info!(user_id = identity.id, provider = %profile.provider, "created federated identity");
                Ok(identity)
            }
            Err(StoreError::Duplicate(field)) => {
                debug!(%field, "concurrent federated create, re-resolving");
                self.lookup(profile).await?.ok_or(AuthError::UserExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn lookup(&self, profile: &ProviderProfile) -> Result<Option<Identity>, AuthError> {
        let store = self.auth.store();
        if let Some(identity) = store
            .get_by_provider_id(profile.provider, &profile.subject)
            .await?
        {
            return Ok(Some(identity));
        }
        if profile.email.is_empty() {
            return Ok(None);
        }
        let Some(mut identity) = store.get_by_email(&profile.email).await? else {
            return Ok(None);
        };

        if identity.provider_id(profile.provider).is_some() {
            warn!(
                user_id = identity.id,
                provider = %profile.provider,
                "email already linked to a different provider account"
            );
            return Err(AuthError::UserExists);
        }
        if !identity.is_active {
            // Left unlinked; the caller rejects inactive identities.
            return Ok(Some(identity));
        }

        identity.set_provider_id(profile.provider, profile.subject.clone());
        if identity.avatar_url.as_deref().is_none_or(str::is_empty) {
            identity.avatar_url = profile.avatar_url.clone();
        }
        let linked = store.update(&identity).await?;
        info!(user_id = linked.id, provider = %profile.provider, "linked provider account");
        Ok(Some(linked))
    }
}

fn new_identity(profile: &ProviderProfile) -> NewIdentity {
    let mut new = NewIdentity {
        email: profile.email.clone(),
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        is_active: true,
        is_verified: profile.email_verified,
        role: Role::User,
        avatar_url: profile.avatar_url.clone(),
        bio: profile.bio.clone(),
        website: profile.website.clone(),
        location: profile.location.clone(),
        ..Default::default()
    };
    match profile.provider {
        Provider::Google => new.google_id = Some(profile.subject.clone()),
        Provider::GitHub => new.github_id = Some(profile.subject.clone()),
    }
    new
}
