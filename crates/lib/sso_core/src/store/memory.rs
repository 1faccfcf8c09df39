//! In-memory credential store.
//!
//! A single write lock covers every index, so uniqueness checks and inserts
//! are atomic with respect to each other. Used by tests and local demos.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::{CredentialStore, Result, StoreError, start_of_day};
use crate::models::{Identity, IdentityStats, NewIdentity, Provider, Role};

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, Identity>,
}

impl Inner {
    /// Reject `candidate` if another row already holds one of its unique values.
    fn check_unique(&self, candidate: &Identity) -> Result<()> {
        for row in self.rows.values().filter(|r| r.id != candidate.id) {
            if !candidate.email.is_empty() && row.email == candidate.email {
                return Err(StoreError::Duplicate("email".into()));
            }
            if candidate.google_id.is_some() && row.google_id == candidate.google_id {
                return Err(StoreError::Duplicate("google_id".into()));
            }
            if candidate.github_id.is_some() && row.github_id == candidate.github_id {
                return Err(StoreError::Duplicate("github_id".into()));
            }
        }
        Ok(())
    }
}

/// Credential store backed by a `BTreeMap` behind a `tokio` `RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities.
    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    #[cfg(test)]
    pub(crate) async fn backdate(&self, id: i64, created_at: DateTime<Utc>) {
        if let Some(row) = self.inner.write().await.rows.get_mut(&id) {
            row.created_at = created_at;
        }
    }
}

fn page(rows: impl Iterator<Item = Identity>, limit: i64, offset: i64) -> Vec<Identity> {
    rows.skip(usize::try_from(offset).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect()
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create(&self, new: NewIdentity) -> Result<Identity> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let identity = Identity {
            id: inner.next_id + 1,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            is_active: new.is_active,
            is_verified: new.is_verified,
            role: new.role,
            is_admin: new.is_admin,
            google_id: new.google_id,
            github_id: new.github_id,
            avatar_url: new.avatar_url,
            bio: new.bio,
            website: new.website,
            location: new.location,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.check_unique(&identity)?;
        inner.next_id = identity.id;
        inner.rows.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Identity>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Identity>> {
        if email.is_empty() {
            return Ok(None);
        }
        let inner = self.inner.read().await;
        Ok(inner.rows.values().find(|r| r.email == email).cloned())
    }

    async fn get_by_provider_id(
        &self,
        provider: Provider,
        provider_id: &str,
    ) -> Result<Option<Identity>> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .values()
            .find(|r| r.provider_id(provider) == Some(provider_id))
            .cloned())
    }

    async fn update(&self, identity: &Identity) -> Result<Identity> {
        let mut inner = self.inner.write().await;
        let created_at = inner
            .rows
            .get(&identity.id)
            .map(|r| r.created_at)
            .ok_or(StoreError::NotFound)?;
        inner.check_unique(identity)?;
        let mut stored = identity.clone();
        stored.created_at = created_at;
        stored.updated_at = Utc::now();
        inner.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.inner
            .write()
            .await
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Identity>> {
        let inner = self.inner.read().await;
        Ok(page(inner.rows.values().cloned(), limit, offset))
    }

    async fn search(&self, query: &str, limit: i64, offset: i64) -> Result<Vec<Identity>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        let matches = inner.rows.values().filter(|r| {
            r.first_name.to_lowercase().contains(&needle)
                || r.last_name.to_lowercase().contains(&needle)
                || r.email.to_lowercase().contains(&needle)
        });
        Ok(page(matches.cloned(), limit, offset))
    }

    async fn list_by_role(&self, role: Role, limit: i64, offset: i64) -> Result<Vec<Identity>> {
        let inner = self.inner.read().await;
        Ok(page(
            inner.rows.values().filter(|r| r.role == role).cloned(),
            limit,
            offset,
        ))
    }

    async fn list_recent(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Identity>> {
        let inner = self.inner.read().await;
        let mut recent: Vec<Identity> = inner
            .rows
            .values()
            .filter(|r| r.created_at >= since)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page(recent.into_iter(), limit, offset))
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<IdentityStats> {
        let inner = self.inner.read().await;
        let today = start_of_day(now);
        let week = now - Duration::days(7);
        let month = now - Duration::days(30);
        let count = |pred: &dyn Fn(&Identity) -> bool| -> i64 {
            inner.rows.values().filter(|r| pred(r)).count() as i64
        };
        Ok(IdentityStats {
            total_users: inner.rows.len() as i64,
            active_users: count(&|r| r.is_active),
            verified_users: count(&|r| r.is_verified),
            admin_users: count(&|r| r.role == Role::Admin || r.is_admin),
            new_users_today: count(&|r| r.created_at >= today),
            new_users_week: count(&|r| r.created_at >= week),
            new_users_month: count(&|r| r.created_at >= month),
        })
    }
}
