//! Admin console operations.
//!
//! Every operation takes the acting identity, runs the policy check, and
//! only then touches the store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::auth::AuthError;
use crate::auth::service::validate_email;
use crate::models::auth::non_empty;
use crate::models::identity::normalize_email;
use crate::models::{AdminUpdate, Identity, IdentityStats, Role};
use crate::policy::{AdminAction, UpdateScope, authorize};
use crate::store::CredentialStore;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;
/// Widest window accepted by [`AdminService::recent_users`].
pub const MAX_RECENT_DAYS: i64 = 3650;

/// Clamp a requested page size to `1..=MAX_PAGE_LIMIT`.
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_PAGE_LIMIT)
}

/// Policy check with the denial logged. Self-protection refusals are the
/// ones an operator may want to see.
fn check(
    actor: &Identity,
    action: AdminAction,
    target: Option<&Identity>,
) -> Result<(), AuthError> {
    authorize(actor, action, target).map_err(|denial| {
        let target_id = target.map(|t| t.id);
        if denial.is_self_protection() {
            warn!(actor_id = actor.id, ?target_id, %denial, "admin action refused");
        } else {
            debug!(actor_id = actor.id, ?target_id, %denial, "admin action denied");
        }
        AuthError::NotAuthorized(denial)
    })
}

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn CredentialStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    async fn target(&self, id: i64) -> Result<Identity, AuthError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn stats(&self, actor: &Identity) -> Result<IdentityStats, AuthError> {
        check(actor, AdminAction::ViewStats, None)?;
        Ok(self.store.stats(Utc::now()).await?)
    }

    pub async fn list_users(
        &self,
        actor: &Identity,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Identity>, AuthError> {
        check(actor, AdminAction::ListUsers, None)?;
        Ok(self.store.list(clamp_limit(limit), offset.max(0)).await?)
    }

    pub async fn users_by_role(
        &self,
        actor: &Identity,
        role: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Identity>, AuthError> {
        check(actor, AdminAction::ListUsers, None)?;
        let role: Role = role.parse()?;
        Ok(self
            .store
            .list_by_role(role, clamp_limit(limit), offset.max(0))
            .await?)
    }

    pub async fn search_users(
        &self,
        actor: &Identity,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Identity>, AuthError> {
        check(actor, AdminAction::ListUsers, None)?;
        Ok(self
            .store
            .search(query.trim(), clamp_limit(limit), offset.max(0))
            .await?)
    }

    /// Identities created within the last `days` days, newest first.
    pub async fn recent_users(
        &self,
        actor: &Identity,
        days: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Identity>, AuthError> {
        check(actor, AdminAction::ListUsers, None)?;
        let since = Utc::now() - Duration::days(days.clamp(1, MAX_RECENT_DAYS));
        Ok(self
            .store
            .list_recent(since, clamp_limit(limit), offset.max(0))
            .await?)
    }

    pub async fn user(&self, actor: &Identity, id: i64) -> Result<Identity, AuthError> {
        check(actor, AdminAction::ListUsers, None)?;
        let target = self.target(id).await?;
        check(actor, AdminAction::ViewUser, Some(&target))?;
        Ok(target)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Apply an admin edit. The role value is validated before anything else.
    pub async fn update_user(
        &self,
        actor: &Identity,
        id: i64,
        update: AdminUpdate,
    ) -> Result<Identity, AuthError> {
        let role = update.role.as_deref().map(str::parse::<Role>).transpose()?;
        check(actor, AdminAction::ListUsers, None)?;
        let mut target = self.target(id).await?;
        let scope = UpdateScope::of(&update, role, &target);
        check(actor, AdminAction::Update(scope), Some(&target))?;

        if let Some(first_name) = non_empty(update.first_name) {
            target.first_name = first_name;
        }
        if let Some(last_name) = non_empty(update.last_name) {
            target.last_name = last_name;
        }
        if let Some(email) = update.email {
            let email = normalize_email(&email);
            validate_email(&email)?;
            target.email = email;
        }
        if update.bio.is_some() {
            target.bio = non_empty(update.bio);
        }
        if update.website.is_some() {
            target.website = non_empty(update.website);
        }
        if update.location.is_some() {
            target.location = non_empty(update.location);
        }
        if let Some(is_active) = update.is_active {
            target.is_active = is_active;
        }
        if let Some(is_verified) = update.is_verified {
            target.is_verified = is_verified;
        }
        if let Some(is_admin) = update.is_admin {
            target.is_admin = is_admin;
        }
        if let Some(role) = role {
            target.role = role;
        }

        let updated = self.store.update(&target).await?;
        info!(actor_id = actor.id, user_id = updated.id, "admin updated identity");
        Ok(updated)
    }

    pub async fn activate_user(&self, actor: &Identity, id: i64) -> Result<Identity, AuthError> {
        self.set_active(actor, id, true).await
    }

    pub async fn deactivate_user(&self, actor: &Identity, id: i64) -> Result<Identity, AuthError> {
        self.set_active(actor, id, false).await
    }

    async fn set_active(
        &self,
        actor: &Identity,
        id: i64,
        active: bool,
    ) -> Result<Identity, AuthError> {
        check(actor, AdminAction::ListUsers, None)?;
        let mut target = self.target(id).await?;
        let action = if active {
            AdminAction::Activate
        } else {
            AdminAction::Deactivate
        };
        check(actor, action, Some(&target))?;
        target.is_active = active;
        let updated = self.store.update(&target).await?;
        info!(actor_id = actor.id, user_id = id, active, "admin changed activation");
        Ok(updated)
    }

    pub async fn delete_user(&self, actor: &Identity, id: i64) -> Result<(), AuthError> {
        check(actor, AdminAction::ListUsers, None)?;
        let target = self.target(id).await?;
        check(actor, AdminAction::Delete, Some(&target))?;
        self.store.delete(id).await?;
        info!(actor_id = actor.id, user_id = id, "admin deleted identity");
        Ok(())
    }

    /// Grant full admin: role `admin` and the legacy flag.
    pub async fn promote_to_admin(&self, actor: &Identity, id: i64) -> Result<Identity, AuthError> {
        check(actor, AdminAction::Promote, None)?;
        let mut target = self.target(id).await?;
        check(actor, AdminAction::Promote, Some(&target))?;
        target.role = Role::Admin;
        target.is_admin = true;
        let updated = self.store.update(&target).await?;
        info!(actor_id = actor.id, user_id = id, "promoted to admin");
        Ok(updated)
    }

    /// Remove admin: role `user` and the flag cleared.
    pub async fn demote_from_admin(
        &self,
        actor: &Identity,
        id: i64,
    ) -> Result<Identity, AuthError> {
        check(actor, AdminAction::Demote, None)?;
        let mut target = self.target(id).await?;
        check(actor, AdminAction::Demote, Some(&target))?;
        target.role = Role::User;
        target.is_admin = false;
        let updated = self.store.update(&target).await?;
        info!(actor_id = actor.id, user_id = id, "demoted from admin");
        Ok(updated)
    }
}
