//! Bootstrap data: one admin plus a few demo identities.

use sso_core::auth::password::PasswordHasher;
use sso_core::models::identity::normalize_email;
use sso_core::models::{NewIdentity, Role};
use sso_core::store::{CredentialStore, StoreError};

use crate::Result;

pub const ADMIN_EMAIL: &str = "admin@example.com";

struct SeedIdentity {
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    role: Role,
    is_admin: bool,
    is_active: bool,
    is_verified: bool,
    bio: &'static str,
    location: &'static str,
}

const SEEDS: [SeedIdentity; 4] = [
    SeedIdentity {
        first_name: "System",
        last_name: "Administrator",
        email: ADMIN_EMAIL,
        role: Role::Admin,
        is_admin: true,
        is_active: true,
        is_verified: true,
        bio: "System administrator account for managing the SSO application",
        location: "System",
    },
    SeedIdentity {
        first_name: "John",
        last_name: "Doe",
        email: "john.doe@example.com",
        role: Role::User,
        is_admin: false,
        is_active: true,
        is_verified: true,
        bio: "Regular user account for testing",
        location: "New York, USA",
    },
    SeedIdentity {
        first_name: "Jane",
        last_name: "Smith",
        email: "jane.smith@example.com",
        role: Role::Moderator,
        is_admin: false,
        is_active: true,
        is_verified: false,
        bio: "Moderator account for testing",
        location: "Los Angeles, USA",
    },
    SeedIdentity {
        first_name: "Bob",
        last_name: "Johnson",
        email: "bob.johnson@example.com",
        role: Role::User,
        is_admin: false,
        is_active: false,
        is_verified: true,
        bio: "Inactive user account for testing",
        location: "Chicago, USA",
    },
];

/// Outcome of a seeding run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

/// Create every seed identity that is not already present.
///
/// Existing rows are left untouched, so running this twice is harmless.
pub async fn seed(
    store: &dyn CredentialStore,
    hasher: &PasswordHasher,
    password: &str,
) -> Result<SeedReport> {
    let password_hash = hasher.hash(password)?;
    let mut report = SeedReport::default();

    for s in &SEEDS {
        let email = normalize_email(s.email);
        if store.get_by_email(&email).await?.is_some() {
            log::info!("Identity already exists: {email}");
            report.skipped.push(email);
            continue;
        }

        let new = NewIdentity {
            email: email.clone(),
            password_hash: Some(password_hash.clone()),
            first_name: s.first_name.into(),
            last_name: s.last_name.into(),
            is_active: s.is_active,
            is_verified: s.is_verified,
            role: s.role,
            is_admin: s.is_admin,
            bio: Some(s.bio.into()),
            location: Some(s.location.into()),
            ..NewIdentity::default()
        };

        match store.create(new).await {
            Ok(identity) => {
                log::info!("Created {} ({}, id {})", identity.email, identity.role, identity.id);
                report.created.push(email);
            }
            Err(StoreError::Duplicate(_)) => {
                log::warn!("Identity created concurrently: {email}");
                report.skipped.push(email);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(report)
}
