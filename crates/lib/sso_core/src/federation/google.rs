//! Google OAuth2 provider.

use async_trait::async_trait;
use serde::Deserialize;

use super::client::OAuthClient;
use super::{IdentityProvider, ProviderProfile};
use crate::auth::AuthError;
use crate::config::ProviderConfig;
use crate::models::Provider;
use crate::models::auth::non_empty;
use crate::models::identity::normalize_email;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const SCOPES: [&str; 3] = ["openid", "email", "profile"];

/// Subset of the v2 userinfo response.
#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<GoogleUser> for ProviderProfile {
    fn from(user: GoogleUser) -> Self {
        ProviderProfile {
            provider: Provider::Google,
            subject: user.id,
            email: normalize_email(&user.email),
            email_verified: true,
            first_name: user.given_name.unwrap_or_default(),
            last_name: user.family_name.unwrap_or_default(),
            avatar_url: non_empty(user.picture),
            bio: None,
            website: None,
            location: None,
        }
    }
}

pub struct GoogleProvider {
    client: OAuthClient,
}

impl GoogleProvider {
    pub fn new(http: reqwest::Client, config: ProviderConfig) -> Self {
        Self {
            client: OAuthClient::new(http, config, AUTH_URL, TOKEN_URL),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    /// Requests offline access so Google also issues a refresh token.
    fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        self.client
            .authorization_url(&SCOPES, state, &[("access_type", "offline")])
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        self.client.exchange_code(code).await
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, AuthError> {
        let user: GoogleUser = self.client.get_json(USERINFO_URL, access_token).await?;
        if user.id.is_empty() {
            return Err(AuthError::FederationProfileUnavailable(
                "google profile has no id".into(),
            ));
        }
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::federation::client::http_client;

    #[test]
    fn userinfo_maps_to_verified_profile() {
        let user: GoogleUser = serde_json::from_str(
            r#"{
                "id": "1098",
                "email": "Alice@Example.com",
                "verified_email": true,
                "name": "Alice Liddell",
                "given_name": "Alice",
                "family_name": "Liddell",
                "picture": "https://lh3.example.com/a.png"
            }"#,
        )
        .unwrap();
        let profile = ProviderProfile::from(user);
        assert_eq!(profile.subject, "1098");
        assert_eq!(profile.email, "alice@example.com");
        assert!(profile.email_verified);
        assert_eq!(profile.first_name, "Alice");
        assert_eq!(profile.last_name, "Liddell");
        assert_eq!(profile.avatar_url.as_deref(), Some("https://lh3.example.com/a.png"));
    }

    #[test]
    fn authorization_url_requests_offline_access() {
        let provider = GoogleProvider::new(
            http_client(Duration::from_secs(1)).unwrap(),
            ProviderConfig {
                client_id: "gid".into(),
                client_secret: "gsecret".into(),
                redirect_url: "http://localhost:8080/auth/google/callback".into(),
                scopes: None,
            },
        );
        let url = provider.authorization_url("xyz").unwrap();
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("scope=openid+email+profile"));
        assert!(url.contains("state=xyz"));
    }
}
