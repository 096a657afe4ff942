//! Role checks.
//!
//! Roles are compared against the [`Principal`] resolved for this request,
//! never against the role inside the credential. An empty allow-list denies
//! everyone.

use lectern_core::AppError;
use lectern_models::UserRole;

use crate::metrics::track_authorization_denied;
use crate::middleware::auth::Principal;
use crate::security_event;

pub fn is_allowed(role: UserRole, allowed: &[UserRole]) -> bool {
    allowed.contains(&role)
}

/// Fails closed: a missing principal is denied like a wrong role.
pub fn check_any_role(
    principal: Option<&Principal>,
    allowed: &[UserRole],
    message: &str,
) -> Result<(), AppError> {
    match principal {
        Some(principal) if is_allowed(principal.role, allowed) => Ok(()),
        Some(principal) => {
            security_event!(
                "authz.role_denied",
                user.id = %principal.id,
                user.role = %principal.role,
                "Role not permitted"
            );
            track_authorization_denied("role");
            Err(AppError::forbidden(message))
        }
        None => {
            track_authorization_denied("role");
            Err(AppError::forbidden(message))
        }
    }
}

pub fn check_role(principal: &Principal, required: UserRole, message: &str) -> Result<(), AppError> {
    check_any_role(Some(principal), &[required], message)
}

/// Defines an extractor that authenticates and then requires one of `roles`.
#[macro_export]
macro_rules! require_role {
    ($name:ident, $message:literal, [$($role:expr),+ $(,)?]) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub $crate::middleware::auth::Principal);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = lectern_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let $crate::middleware::auth::AuthUser(principal) = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<$crate::state::AppState>>::from_request_parts(parts, state).await?;

                $crate::middleware::role::check_any_role(Some(&principal), &[$($role),+], $message)?;

                Ok($name(principal))
            }
        }
    };
}

require_role!(
    RequireStudent,
    "Access denied. Student role required.",
    [UserRole::Student]
);
require_role!(
    RequireTeacher,
    "Access denied. Not a teacher.",
    [UserRole::Teacher]
);
require_role!(
    RequireTeacherOrAdmin,
    "Access denied. Teacher or admin role required.",
    [UserRole::Teacher, UserRole::Admin]
);
require_role!(
    RequireAdmin,
    "Access denied. Admin role required.",
    [UserRole::Admin]
);

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::ErrorKind;
    use lectern_models::UserId;

    fn principal(role: UserRole) -> Principal {
        Principal {
            id: UserId::new(),
            role,
        }
    }

    #[test]
    fn test_is_allowed() {
        assert!(is_allowed(UserRole::Teacher, &[UserRole::Teacher, UserRole::Admin]));
        assert!(!is_allowed(UserRole::Student, &[UserRole::Teacher]));
    }

    #[test]
    fn test_empty_allow_list_denies_everyone() {
        assert!(!is_allowed(UserRole::Admin, &[]));
        let err = check_any_role(Some(&principal(UserRole::Admin)), &[], "denied").unwrap_err();
        assert!(err.is(ErrorKind::Forbidden));
    }

    #[test]
    fn test_missing_principal_is_forbidden() {
        let err = check_any_role(None, &[UserRole::Student], "denied").unwrap_err();
        assert!(err.is(ErrorKind::Forbidden));
    }

    #[test]
    fn test_check_role_message() {
        let err = check_role(
            &principal(UserRole::Teacher),
            UserRole::Student,
            "Only students can enroll",
        )
        .unwrap_err();
        assert_eq!(err.public_message(), "Only students can enroll");
        assert!(check_role(&principal(UserRole::Student), UserRole::Student, "x").is_ok());
    }
}
