//! Engine configuration.
//!
//! Built once at startup and handed to the services by value. Nothing here
//! is read from the environment after construction.

use std::fmt;
use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;
use tracing::warn;

use crate::auth::jwt::DEFAULT_TOKEN_TTL_HOURS;
use crate::auth::password::DEFAULT_BCRYPT_COST;
use crate::auth::secret::resolve_jwt_secret;
use crate::models::Provider;

/// Default timeout for outbound provider HTTP calls.
pub const DEFAULT_OAUTH_HTTP_TIMEOUT_SECS: u64 = 10;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// OAuth client registration for one provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// Overrides the provider's default scopes when set.
    pub scopes: Option<Vec<String>>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_url", &self.redirect_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Configuration for the authentication engine.
#[derive(Clone)]
pub struct SsoConfig {
    /// HMAC secret for session tokens.
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub oauth_http_timeout: StdDuration,
    pub google: Option<ProviderConfig>,
    pub github: Option<ProviderConfig>,
}

impl SsoConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable                    | Default                          |
    /// |-----------------------------|----------------------------------|
    /// | `JWT_SECRET` / `AUTH_SECRET`| generated & persisted to file    |
    /// | `TOKEN_TTL_HOURS`           | `168`                            |
    /// | `BCRYPT_COST`               | `10`                             |
    /// | `OAUTH_HTTP_TIMEOUT_SECS`   | `10`                             |
    /// | `GOOGLE_CLIENT_ID` etc.     | provider disabled when unset     |
    /// | `GOOGLE_SCOPES`             | provider defaults                |
    /// | `GITHUB_CLIENT_ID` etc.     | provider disabled when unset     |
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = resolve_jwt_secret();
        Self::from_lookup(jwt_secret, |name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. The secret is supplied
    /// separately so callers control how it is resolved.
    pub fn from_lookup(
        jwt_secret: String,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let token_ttl_hours: i64 = parse_or(&lookup, "TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue {
                name: "TOKEN_TTL_HOURS",
                value: token_ttl_hours.to_string(),
            });
        }
        let bcrypt_cost: u32 = parse_or(&lookup, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                name: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }
        let timeout_secs: u64 = parse_or(
            &lookup,
            "OAUTH_HTTP_TIMEOUT_SECS",
            DEFAULT_OAUTH_HTTP_TIMEOUT_SECS,
        )?;

        Ok(Self {
            jwt_secret,
            token_ttl: Duration::hours(token_ttl_hours),
            bcrypt_cost,
            oauth_http_timeout: StdDuration::from_secs(timeout_secs),
            google: provider_from(&lookup, Provider::Google, "GOOGLE"),
            github: provider_from(&lookup, Provider::GitHub, "GITHUB"),
        })
    }

    /// Minimal configuration with no providers enabled.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            oauth_http_timeout: StdDuration::from_secs(DEFAULT_OAUTH_HTTP_TIMEOUT_SECS),
            google: None,
            github: None,
        }
    }

    pub fn provider(&self, provider: Provider) -> Option<&ProviderConfig> {
        match provider {
            Provider::Google => self.google.as_ref(),
            Provider::GitHub => self.github.as_ref(),
        }
    }
}

impl fmt::Debug for SsoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsoConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("oauth_http_timeout", &self.oauth_http_timeout)
            .field("google", &self.google)
            .field("github", &self.github)
            .finish()
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name, value: raw })
        }
        _ => Ok(default),
    }
}

fn provider_from(
    lookup: &impl Fn(&str) -> Option<String>,
    provider: Provider,
    prefix: &str,
) -> Option<ProviderConfig> {
    let var = |suffix: &str| lookup(&format!("{prefix}_{suffix}")).filter(|v| !v.is_empty());
    let Some(client_id) = var("CLIENT_ID") else {
        warn!(%provider, "OAuth provider not configured");
        return None;
    };
    Some(ProviderConfig {
        client_id,
        client_secret: var("CLIENT_SECRET").unwrap_or_default(),
        redirect_url: var("REDIRECT_URL").unwrap_or_default(),
        scopes: var("SCOPES").map(|raw| parse_scopes(&raw)),
    })
}

/// Scopes separated by commas and/or whitespace.
fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = SsoConfig::from_lookup("s3cret".into(), lookup(&[])).unwrap();
        assert_eq!(config.token_ttl, Duration::days(7));
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.oauth_http_timeout, StdDuration::from_secs(10));
        assert!(config.google.is_none());
        assert!(config.github.is_none());
    }

    #[test]
    fn provider_enabled_by_client_id() {
        let config = SsoConfig::from_lookup(
            "s3cret".into(),
            lookup(&[
                ("GITHUB_CLIENT_ID", "gh-id"),
                ("GITHUB_CLIENT_SECRET", "gh-secret"),
                ("GITHUB_REDIRECT_URL", "http://localhost:8080/auth/github/callback"),
            ]),
        )
        .unwrap();
        let github = config.provider(Provider::GitHub).unwrap();
        assert_eq!(github.client_id, "gh-id");
        assert!(github.scopes.is_none());
        assert!(config.provider(Provider::Google).is_none());
    }

    #[test]
    fn provider_scopes_can_be_overridden() {
        let config = SsoConfig::from_lookup(
            "s3cret".into(),
            lookup(&[
                ("GOOGLE_CLIENT_ID", "g-id"),
                ("GOOGLE_SCOPES", "openid, email  https://www.googleapis.com/auth/drive"),
            ]),
        )
        .unwrap();
        let google = config.provider(Provider::Google).unwrap();
        assert_eq!(
            google.scopes.as_deref().unwrap(),
            ["openid", "email", "https://www.googleapis.com/auth/drive"]
        );
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = SsoConfig::from_lookup("s".into(), lookup(&[("BCRYPT_COST", "ten")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "BCRYPT_COST", .. }));
        assert!(SsoConfig::from_lookup("s".into(), lookup(&[("BCRYPT_COST", "2")])).is_err());
        assert!(SsoConfig::from_lookup("s".into(), lookup(&[("TOKEN_TTL_HOURS", "0")])).is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = SsoConfig::from_lookup(
            "jwt-top-secret".into(),
            lookup(&[("GOOGLE_CLIENT_ID", "g-id"), ("GOOGLE_CLIENT_SECRET", "g-top-secret")]),
        )
        .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("jwt-top-secret"));
        assert!(!debug.contains("g-top-secret"));
        assert!(debug.contains("g-id"));
    }
}
