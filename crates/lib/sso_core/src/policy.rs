//! Authorization policy for admin console operations.
//!
//! Two predicates carry the privilege model:
//!
//! - [`is_privileged`]: `role == admin` **or** the legacy `is_admin` flag.
//!   Sufficient for read operations.
//! - [`is_super_admin`]: `role == admin` only. Required for anything that
//!   grants or removes admin status.
//!
//! Every decision is made before the caller writes anything.

use std::fmt;

use crate::models::{AdminUpdate, Identity, Role};

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Actor lacks general admin privileges.
    NotPrivileged,
    /// Actor is privileged only through the legacy flag.
    NotSuperAdmin,
    /// Target is privileged and the actor is not a super-admin.
    PrivilegedTarget,
    SelfDeactivation,
    SelfDeletion,
    SelfDemotion,
}

impl Denial {
    /// Self-protection denials apply regardless of the actor's privilege.
    pub fn is_self_protection(&self) -> bool {
        matches!(
            self,
            Denial::SelfDeactivation | Denial::SelfDeletion | Denial::SelfDemotion
        )
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Denial::NotPrivileged => "admin privileges required",
            Denial::NotSuperAdmin => "super admin privileges required",
            Denial::PrivilegedTarget => "cannot modify an admin account",
            Denial::SelfDeactivation => "cannot deactivate your own account",
            Denial::SelfDeletion => "cannot delete your own account",
            Denial::SelfDemotion => "cannot demote your own account",
        };
        f.write_str(msg)
    }
}

/// General admin capability: role or legacy flag.
pub fn is_privileged(identity: &Identity) -> bool {
    identity.role == Role::Admin || identity.is_admin
}

/// Strict admin capability: role only.
pub fn is_super_admin(identity: &Identity) -> bool {
    identity.role == Role::Admin
}

/// What an admin update would change about privilege and activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateScope {
    pub assigns_admin_role: bool,
    pub changes_admin_flag: bool,
    pub demotes: bool,
    pub deactivates: bool,
}

impl UpdateScope {
    /// Derive the scope of `update` against the current `target`.
    ///
    /// `role` is the already-validated role from the update, if any.
    pub fn of(update: &AdminUpdate, role: Option<Role>, target: &Identity) -> Self {
        let new_role = role.unwrap_or(target.role);
        let new_flag = update.is_admin.unwrap_or(target.is_admin);
        Self {
            assigns_admin_role: role == Some(Role::Admin),
            changes_admin_flag: new_flag != target.is_admin,
            demotes: (target.role == Role::Admin && new_role != Role::Admin)
                || (target.is_admin && !new_flag),
            deactivates: update.is_active == Some(false),
        }
    }
}

/// Admin console operations subject to policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    ViewStats,
    ListUsers,
    ViewUser,
    Update(UpdateScope),
    Activate,
    Deactivate,
    Delete,
    Promote,
    Demote,
}

impl AdminAction {
    fn requires_super_admin(&self) -> bool {
        matches!(self, AdminAction::Promote | AdminAction::Demote)
    }
}

/// Decide whether `actor` may perform `action` on `target`.
pub fn authorize(
    actor: &Identity,
    action: AdminAction,
    target: Option<&Identity>,
) -> Result<(), Denial> {
    if !is_privileged(actor) {
        return Err(Denial::NotPrivileged);
    }
    if action.requires_super_admin() && !is_super_admin(actor) {
        return Err(Denial::NotSuperAdmin);
    }

    let Some(target) = target else {
        return Ok(());
    };

    if target.id == actor.id {
        match action {
            AdminAction::Deactivate => return Err(Denial::SelfDeactivation),
            AdminAction::Delete => return Err(Denial::SelfDeletion),
            AdminAction::Demote => return Err(Denial::SelfDemotion),
            AdminAction::Update(scope) if scope.deactivates => {
                return Err(Denial::SelfDeactivation);
            }
            AdminAction::Update(scope) if scope.demotes => return Err(Denial::SelfDemotion),
            _ => {}
        }
    }

    match action {
        AdminAction::Update(_)
        | AdminAction::Activate
        | AdminAction::Deactivate
        | AdminAction::Delete
            if is_privileged(target) && !is_super_admin(actor) =>
        {
            return Err(Denial::PrivilegedTarget);
        }
        _ => {}
    }

    if let AdminAction::Update(scope) = action
        && (scope.assigns_admin_role || scope.changes_admin_flag)
        && !is_super_admin(actor)
    {
        return Err(Denial::NotSuperAdmin);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn identity(id: i64, role: Role, is_admin: bool) -> Identity {
        let now = Utc::now();
        Identity {
            id,
            email: format!("user{id}@example.com"),
            password_hash: None,
            first_name: "Test".into(),
            last_name: "User".into(),
            is_active: true,
            is_verified: true,
            role,
            is_admin,
            google_id: None,
            github_id: None,
            avatar_url: None,
            bio: None,
            website: None,
            location: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn super_admin() -> Identity {
        identity(1, Role::Admin, true)
    }

    fn flag_admin() -> Identity {
        identity(2, Role::User, true)
    }

    fn plain() -> Identity {
        identity(3, Role::User, false)
    }

    #[test]
    fn predicates_follow_role_and_flag() {
        assert!(is_privileged(&super_admin()));
        assert!(is_super_admin(&super_admin()));
        assert!(is_privileged(&flag_admin()));
        assert!(!is_super_admin(&flag_admin()));
        assert!(is_privileged(&identity(9, Role::Admin, false)));
        assert!(is_super_admin(&identity(9, Role::Admin, false)));
        assert!(!is_privileged(&plain()));
        assert!(!is_privileged(&identity(9, Role::Moderator, false)));
    }

    #[test]
    fn reads_need_privilege_only() {
        for action in [AdminAction::ViewStats, AdminAction::ListUsers] {
            assert_eq!(authorize(&flag_admin(), action, None), Ok(()));
            assert_eq!(authorize(&super_admin(), action, None), Ok(()));
            assert_eq!(
                authorize(&plain(), action, None),
                Err(Denial::NotPrivileged)
            );
        }
        let target = super_admin();
        assert_eq!(
            authorize(&flag_admin(), AdminAction::ViewUser, Some(&target)),
            Ok(())
        );
    }

    #[test]
    fn flag_admin_cannot_promote_or_demote() {
        let target = plain();
        assert_eq!(
            authorize(&flag_admin(), AdminAction::Promote, Some(&target)),
            Err(Denial::NotSuperAdmin)
        );
        assert_eq!(
            authorize(&flag_admin(), AdminAction::Demote, Some(&target)),
            Err(Denial::NotSuperAdmin)
        );
        assert_eq!(
            authorize(&super_admin(), AdminAction::Promote, Some(&target)),
            Ok(())
        );
    }

    #[test]
    fn flag_admin_cannot_mutate_privileged_target() {
        let target = identity(5, Role::Admin, true);
        for action in [
            AdminAction::Activate,
            AdminAction::Deactivate,
            AdminAction::Delete,
            AdminAction::Update(UpdateScope::default()),
        ] {
            assert_eq!(
                authorize(&flag_admin(), action, Some(&target)),
                Err(Denial::PrivilegedTarget)
            );
            assert_eq!(authorize(&super_admin(), action, Some(&target)), Ok(()));
        }
    }

    #[test]
    fn flag_admin_may_mutate_plain_user() {
        let target = plain();
        for action in [
            AdminAction::Activate,
            AdminAction::Deactivate,
            AdminAction::Delete,
            AdminAction::Update(UpdateScope::default()),
        ] {
            assert_eq!(authorize(&flag_admin(), action, Some(&target)), Ok(()));
        }
    }

    #[test]
    fn self_protection_is_unconditional() {
        let me = super_admin();
        assert_eq!(
            authorize(&me, AdminAction::Deactivate, Some(&me)),
            Err(Denial::SelfDeactivation)
        );
        assert_eq!(
            authorize(&me, AdminAction::Delete, Some(&me)),
            Err(Denial::SelfDeletion)
        );
        assert_eq!(
            authorize(&me, AdminAction::Demote, Some(&me)),
            Err(Denial::SelfDemotion)
        );
        assert!(Denial::SelfDemotion.is_self_protection());
        assert!(!Denial::PrivilegedTarget.is_self_protection());
    }

    #[test]
    fn self_protection_reported_for_flag_admin_too() {
        let me = flag_admin();
        assert_eq!(
            authorize(&me, AdminAction::Deactivate, Some(&me)),
            Err(Denial::SelfDeactivation)
        );
    }

    #[test]
    fn update_cannot_demote_or_deactivate_self() {
        let me = super_admin();
        let demote = AdminUpdate {
            role: Some("user".into()),
            ..Default::default()
        };
        let scope = UpdateScope::of(&demote, Some(Role::User), &me);
        assert!(scope.demotes);
        assert_eq!(
            authorize(&me, AdminAction::Update(scope), Some(&me)),
            Err(Denial::SelfDemotion)
        );

        let deactivate = AdminUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        let scope = UpdateScope::of(&deactivate, None, &me);
        assert_eq!(
            authorize(&me, AdminAction::Update(scope), Some(&me)),
            Err(Denial::SelfDeactivation)
        );
    }

    #[test]
    fn self_promotion_is_not_blocked() {
        let me = super_admin();
        assert_eq!(authorize(&me, AdminAction::Promote, Some(&me)), Ok(()));
    }

    #[test]
    fn assigning_admin_through_update_needs_super_admin() {
        let target = plain();
        let update = AdminUpdate {
            role: Some("admin".into()),
            ..Default::default()
        };
        let scope = UpdateScope::of(&update, Some(Role::Admin), &target);
        assert_eq!(
            authorize(&flag_admin(), AdminAction::Update(scope), Some(&target)),
            Err(Denial::NotSuperAdmin)
        );
        assert_eq!(
            authorize(&super_admin(), AdminAction::Update(scope), Some(&target)),
            Ok(())
        );

        let flag = AdminUpdate {
            is_admin: Some(true),
            ..Default::default()
        };
        let scope = UpdateScope::of(&flag, None, &target);
        assert!(scope.changes_admin_flag);
        assert_eq!(
            authorize(&flag_admin(), AdminAction::Update(scope), Some(&target)),
            Err(Denial::NotSuperAdmin)
        );
    }

    #[test]
    fn unchanged_flag_is_not_an_escalation() {
        let target = plain();
        let update = AdminUpdate {
            is_admin: Some(false),
            role: Some("moderator".into()),
            ..Default::default()
        };
        let scope = UpdateScope::of(&update, Some(Role::Moderator), &target);
        assert_eq!(scope, UpdateScope::default());
        assert_eq!(
            authorize(&flag_admin(), AdminAction::Update(scope), Some(&target)),
            Ok(())
        );
    }
}
