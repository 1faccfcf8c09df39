//! Credential store: persistence boundary for identity records.
//!
//! Uniqueness of email and provider ids is enforced by the backing store and
//! surfaced as [`StoreError::Duplicate`]; the core never adjudicates races
//! itself.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Identity, IdentityStats, NewIdentity, Provider, Role};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Credential store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (names the offending field).
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    /// A write targeted a row that does not exist.
    #[error("Record not found")]
    NotFound,

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence operations over identity records.
///
/// Reads return `Ok(None)` when nothing matches.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create(&self, new: NewIdentity) -> Result<Identity>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Identity>>;

    /// Lookup by normalized email. An empty email never matches.
    async fn get_by_email(&self, email: &str) -> Result<Option<Identity>>;

    async fn get_by_provider_id(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<Identity>>;

    /// Persist every mutable field of `identity`, returning the stored row.
    async fn update(&self, identity: &Identity) -> Result<Identity>;

    async fn delete(&self, id: i64) -> Result<()>;

    /// Page through identities in id order.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Identity>>;

    /// Case-insensitive substring match over first name, last name and email.
    async fn search(&self, query: &str, limit: i64, offset: i64) -> Result<Vec<Identity>>;

    async fn list_by_role(&self, role: Role, limit: i64, offset: i64) -> Result<Vec<Identity>>;

    /// Identities created at or after `since`, newest first.
    async fn list_recent(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Identity>>;

    async fn stats(&self, now: DateTime<Utc>) -> Result<IdentityStats>;
}

/// Start of the UTC day containing `now`.
pub(crate) fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}
