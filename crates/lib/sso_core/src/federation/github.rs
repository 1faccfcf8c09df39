//! GitHub OAuth provider.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::client::OAuthClient;
use super::{IdentityProvider, ProviderProfile};
use crate::auth::AuthError;
use crate::config::ProviderConfig;
use crate::models::Provider;
use crate::models::auth::non_empty;
use crate::models::identity::normalize_email;

const AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_URL: &str = "https://api.github.com/user";
const EMAILS_URL: &str = "https://api.github.com/user/emails";
const SCOPES: [&str; 1] = ["user:email"];

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    blog: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    #[serde(default)]
    primary: bool,
}

fn primary_email(emails: Vec<GitHubEmail>) -> Option<String> {
    emails.into_iter().find(|e| e.primary).map(|e| e.email)
}

/// Display name falls back to the login; GitHub has no separate last name.
fn to_profile(user: GitHubUser, email: String) -> ProviderProfile {
    let email = normalize_email(&email);
    let first_name = non_empty(user.name).unwrap_or(user.login);
    ProviderProfile {
        provider: Provider::GitHub,
        subject: user.id.to_string(),
        email_verified: !email.is_empty(),
        email,
        first_name,
        last_name: String::new(),
        avatar_url: non_empty(user.avatar_url),
        bio: non_empty(user.bio),
        website: non_empty(user.blog),
        location: non_empty(user.location),
    }
}

pub struct GitHubProvider {
    client: OAuthClient,
}

impl GitHubProvider {
    pub fn new(http: reqwest::Client, config: ProviderConfig) -> Self {
        Self {
            client: OAuthClient::new(http, config, AUTH_URL, TOKEN_URL),
        }
    }
}

#[async_trait]
impl IdentityProvider for GitHubProvider {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        self.client.authorization_url(&SCOPES, state, &[])
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        self.client.exchange_code(code).await
    }

    /// Private emails are absent from `/user`; the primary address is then
    /// taken from `/user/emails`. Failure there leaves the email empty.
    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, AuthError> {
        let mut user: GitHubUser = self.client.get_json(USER_URL, access_token).await?;
        let email = match non_empty(user.email.take()) {
            Some(email) => email,
            None => match self
                .client
                .get_json::<Vec<GitHubEmail>>(EMAILS_URL, access_token)
                .await
            {
                Ok(emails) => primary_email(emails).unwrap_or_default(),
                Err(e) => {
                    debug!(error = %e, "github primary email lookup failed");
                    String::new()
                }
            },
        };
        Ok(to_profile(user, email))
    }
}
