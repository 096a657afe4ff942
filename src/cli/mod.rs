//! Administrative commands behind `lectern-cli`.
//!
//! These operate on a [`DocumentStore`] directly and never go through HTTP,
//! which is the only way to create an admin account.

pub mod seeder;

use lectern_core::{AppError, hash_password};
use lectern_db::DocumentStore;
use lectern_models::{User, UserRole, normalize_email};

use crate::audit_event;

pub async fn create_admin(
    store: &dyn DocumentStore,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let email = normalize_email(email);
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::conflict("User with this email already exists"));
    }

    let password_hash = hash_password(password)?;
    let admin = User::new(name.trim(), &email, Some(password_hash), UserRole::Admin);

    match store.insert_user(&admin).await {
        Ok(()) => {}
        Err(e) if e.is_duplicate_key() => {
            return Err(AppError::conflict("User with this email already exists"));
        }
        Err(e) => return Err(e.into()),
    }

    audit_event!("create", "admin", user.id = %admin.id, "Admin created from CLI");
    Ok(admin)
}

/// Changes the role of the user registered under `email`.
///
/// Existing tokens keep their old `role` claim, but requests are authorized
/// against the stored role, so the change applies on the next request.
pub async fn set_role(
    store: &dyn DocumentStore,
    email: &str,
    role: UserRole,
) -> Result<User, AppError> {
    let email = normalize_email(email);
    let mut user = store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !store.set_user_role(user.id, role).await? {
        return Err(AppError::not_found("User not found"));
    }

    audit_event!("update", "user_role", user.id = %user.id, from = %user.role.as_str(), to = %role.as_str(), "Role changed from CLI");
    user.role = role;
    Ok(user)
}
