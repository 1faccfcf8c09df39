//! PostgreSQL credential store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use super::{CredentialStore, Result, StoreError, start_of_day};
use crate::models::{Identity, IdentityStats, NewIdentity, Provider, Role};

const COLUMNS: &str = "id, email, password_hash, first_name, last_name, is_active, \
     is_verified, role, is_admin, google_id, github_id, avatar_url, bio, website, \
     location, last_login_at, created_at, updated_at";

/// Raw `identities` row.
#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    id: i64,
    email: Option<String>,
    password_hash: Option<String>,
    first_name: String,
    last_name: String,
    is_active: bool,
    is_verified: bool,
    role: String,
    is_admin: bool,
    google_id: Option<String>,
    github_id: Option<String>,
    avatar_url: Option<String>,
    bio: Option<String>,
    website: Option<String>,
    location: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = StoreError;

    fn try_from(row: IdentityRow) -> Result<Self> {
        let role: Role = row
            .role
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("identity {} has role {:?}", row.id, row.role)))?;
        Ok(Identity {
            id: row.id,
            email: row.email.unwrap_or_default(),
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
            is_verified: row.is_verified,
            role,
            is_admin: row.is_admin,
            google_id: row.google_id,
            github_id: row.github_id,
            avatar_url: row.avatar_url,
            bio: row.bio,
            website: row.website,
            location: row.location,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_identities(rows: Vec<IdentityRow>) -> Result<Vec<Identity>> {
    rows.into_iter().map(Identity::try_from).collect()
}

/// Map unique violations onto `StoreError::Duplicate`.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e
        && db.is_unique_violation()
    {
        let field = match db.constraint() {
            Some("identities_email_key") => "email",
            Some("identities_google_id_key") => "google_id",
            Some("identities_github_id_key") => "github_id",
            _ => "unknown",
        };
        return StoreError::Duplicate(field.into());
    }
    StoreError::Db(e)
}

/// Escape `LIKE` metacharacters in user input.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Credential store backed by the `identities` table.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded migrations in `sso_core/migrations/`.
    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn fetch_one_where(&self, clause: &str, value: &str) -> Result<Option<Identity>> {
        let sql = format!("SELECT {COLUMNS} FROM identities WHERE {clause} = $1");
        let row = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Identity::try_from).transpose()
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn create(&self, new: NewIdentity) -> Result<Identity> {
        let sql = format!(
            "INSERT INTO identities (email, password_hash, first_name, last_name, is_active, \
             is_verified, role, is_admin, google_id, github_id, avatar_url, bio, website, location) \
             VALUES (NULLIF($1, ''), $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(new.is_active)
            .bind(new.is_verified)
            .bind(new.role.as_str())
            .bind(new.is_admin)
            .bind(&new.google_id)
            .bind(&new.github_id)
            .bind(&new.avatar_url)
            .bind(&new.bio)
            .bind(&new.website)
            .bind(&new.location)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Identity::try_from(row)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Identity>> {
        let sql = format!("SELECT {COLUMNS} FROM identities WHERE id = $1");
        let row = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Identity::try_from).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Identity>> {
        if email.is_empty() {
            return Ok(None);
        }
        self.fetch_one_where("email", email).await
    }

    async fn get_by_provider_id(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<Identity>> {
        let column = match provider {
            Provider::Google => "google_id",
            Provider::GitHub => "github_id",
        };
        self.fetch_one_where(column, provider_id).await
    }

    async fn update(&self, identity: &Identity) -> Result<Identity> {
        let sql = format!(
            "UPDATE identities SET email = NULLIF($2, ''), password_hash = $3, first_name = $4, \
             last_name = $5, is_active = $6, is_verified = $7, role = $8, is_admin = $9, \
             google_id = $10, github_id = $11, avatar_url = $12, bio = $13, website = $14, \
             location = $15, last_login_at = $16, updated_at = now() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(identity.id)
            .bind(&identity.email)
            .bind(&identity.password_hash)
            .bind(&identity.first_name)
            .bind(&identity.last_name)
            .bind(identity.is_active)
            .bind(identity.is_verified)
            .bind(identity.role.as_str())
            .bind(identity.is_admin)
            .bind(&identity.google_id)
            .bind(&identity.github_id)
            .bind(&identity.avatar_url)
            .bind(&identity.bio)
            .bind(&identity.website)
            .bind(&identity.location)
            .bind(identity.last_login_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        row.map(Identity::try_from)
            .transpose()?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Identity>> {
        let sql = format!("SELECT {COLUMNS} FROM identities ORDER BY id LIMIT $1 OFFSET $2");
        let rows = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        into_identities(rows)
    }

    async fn search(&self, query: &str, limit: i64, offset: i64) -> Result<Vec<Identity>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM identities \
             WHERE first_name ILIKE $1 OR last_name ILIKE $1 OR email ILIKE $1 \
             ORDER BY id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(like_pattern(query))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        into_identities(rows)
    }

    async fn list_by_role(&self, role: Role, limit: i64, offset: i64) -> Result<Vec<Identity>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM identities WHERE role = $1 ORDER BY id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(role.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        into_identities(rows)
    }

    async fn list_recent(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Identity>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM identities WHERE created_at >= $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, IdentityRow>(&sql)
            .bind(since)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        into_identities(rows)
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<IdentityStats> {
        let (total, active, verified, admins, today, week, month) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64, i64)>(
                "SELECT COUNT(*), \
                        COUNT(*) FILTER (WHERE is_active), \
                        COUNT(*) FILTER (WHERE is_verified), \
                        COUNT(*) FILTER (WHERE role = 'admin' OR is_admin), \
                        COUNT(*) FILTER (WHERE created_at >= $1), \
                        COUNT(*) FILTER (WHERE created_at >= $2), \
                        COUNT(*) FILTER (WHERE created_at >= $3) \
                 FROM identities",
            )
            .bind(start_of_day(now))
            .bind(now - Duration::days(7))
            .bind(now - Duration::days(30))
            .fetch_one(&self.pool)
            .await?;
        Ok(IdentityStats {
            total_users: total,
            active_users: active,
            verified_users: verified,
            admin_users: admins,
            new_users_today: today,
            new_users_week: week,
            new_users_month: month,
        })
    }
}
