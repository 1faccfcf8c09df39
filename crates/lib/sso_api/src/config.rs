//! API server configuration.

use sso_core::config::{ConfigError, SsoConfig};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Mark cookies `Secure` (HTTPS deployments).
    pub cookie_secure: bool,
    /// Where OAuth callbacks redirect after a successful login.
    pub post_login_redirect: String,
    /// Engine configuration.
    pub sso: SsoConfig,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable              | Default                          |
    /// |-----------------------|----------------------------------|
    /// | `BIND_ADDR`           | `127.0.0.1:8080`                 |
    /// | `DATABASE_URL`        | `postgres://localhost:5432/sso`  |
    /// | `COOKIE_SECURE`       | `false`                          |
    /// | `POST_LOGIN_REDIRECT` | `/dashboard`                     |
    ///
    /// Engine variables are documented on [`SsoConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/sso".into()),
            cookie_secure: std::env::var("COOKIE_SECURE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            post_login_redirect: std::env::var("POST_LOGIN_REDIRECT")
                .unwrap_or_else(|_| "/dashboard".into()),
            sso: SsoConfig::from_env()?,
        })
    }

    /// Local defaults around an existing engine configuration.
    pub fn with_sso(sso: SsoConfig) -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            database_url: "postgres://localhost:5432/sso".into(),
            cookie_secure: false,
            post_login_redirect: "/dashboard".into(),
            sso,
        }
    }
}
