//! Shared OAuth2 authorization-code plumbing for the concrete providers.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::AuthError;
use crate::config::ProviderConfig;

/// Build the HTTP client used for every provider call.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, AuthError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("sso/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AuthError::Internal(format!("http client: {e}")))
}

/// Token endpoint response. Providers may answer 200 with an `error` field.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// One provider's client registration plus endpoints.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: ProviderConfig,
    auth_url: String,
    token_url: String,
}

impl OAuthClient {
    pub fn new(
        http: reqwest::Client,
        config: ProviderConfig,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            config,
            auth_url: auth_url.into(),
            token_url: token_url.into(),
        }
    }

    /// Authorization URL carrying client id, redirect, scopes and `state`.
    ///
    /// Configured scopes replace `default_scopes` when present.
    pub fn authorization_url(
        &self,
        default_scopes: &[&str],
        state: &str,
        extra: &[(&str, &str)],
    ) -> Result<String, AuthError> {
        let scope = match &self.config.scopes {
            Some(scopes) if !scopes.is_empty() => scopes.join(" "),
            _ => default_scopes.join(" "),
        };
        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
        ];
        params.extend_from_slice(extra);
        Url::parse_with_params(&self.auth_url, &params)
            .map(String::from)
            .map_err(|e| AuthError::Internal(format!("authorization url: {e}")))
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
        ];

        let resp = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::FederationExchangeFailed(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            debug!(%status, "token endpoint rejected code");
            return Err(AuthError::FederationExchangeFailed(format!("HTTP {status}")));
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::FederationExchangeFailed(format!("parse error: {e}")))?;
        access_token_from(body)
    }

    /// Authenticated GET returning JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, AuthError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::FederationProfileUnavailable(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(AuthError::FederationProfileUnavailable(format!(
                "HTTP {status} from {url}"
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| AuthError::FederationProfileUnavailable(format!("parse error: {e}")))
    }
}

fn access_token_from(body: TokenResponse) -> Result<String, AuthError> {
    if let Some(error) = body.error {
        let detail = body.error_description.unwrap_or_default();
        return Err(AuthError::FederationExchangeFailed(
            format!("{error} {detail}").trim_end().to_string(),
        ));
    }
    body.access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::FederationExchangeFailed("no access token in response".into()))
}
