//! User documents, roles, and the summaries embedded in other responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::id_set::IdSet;
use crate::ids::{CourseId, UserId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Teacher,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Teacher => "teacher",
            UserRole::Admin => "admin",
        }
    }

    /// Roles a visitor may pick when registering. Admins are provisioned
    /// out of band.
    pub fn is_self_service(&self) -> bool {
        matches!(self, UserRole::Student | UserRole::Teacher)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(UserRole::Student),
            "teacher" => Ok(UserRole::Teacher),
            "admin" => Ok(UserRole::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A user document.
///
/// `enrolled_course_ids` mirrors the rosters of the courses this user is
/// enrolled in, and `created_course_ids` mirrors the courses they teach.
/// Both are caches; the course documents are authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub role: UserRole,
    /// External identity provider this account signs in with, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_provider: Option<String>,
    /// Subject identifier issued by `oauth_provider`
    #[serde(skip)]
    pub oauth_id: Option<String>,
    #[schema(value_type = Vec<String>)]
    pub enrolled_course_ids: IdSet<CourseId>,
    #[schema(value_type = Vec<String>)]
    pub created_course_ids: IdSet<CourseId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: Option<String>,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name: name.into(),
            email: normalize_email(&email.into()),
            password_hash,
            role,
            oauth_provider: None,
            oauth_id: None,
            enrolled_course_ids: IdSet::new(),
            created_course_ids: IdSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// A password-less account linked to an external identity.
    pub fn linked(
        name: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
        provider: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            oauth_provider: Some(provider.into()),
            oauth_id: Some(subject.into()),
            ..Self::new(name, email, None, role)
        }
    }

    pub fn is_linked_to(&self, provider: &str, subject: &str) -> bool {
        self.oauth_provider.as_deref() == Some(provider)
            && self.oauth_id.as_deref() == Some(subject)
    }
}

/// Emails are matched case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Public projection of a user embedded in course and studio responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!("Teacher".parse::<UserRole>().unwrap(), UserRole::Teacher);
        assert_eq!(" admin ".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Student).unwrap(), r#""student""#);
        let role: UserRole = serde_json::from_str(r#""teacher""#).unwrap();
        assert_eq!(role, UserRole::Teacher);
    }

    #[test]
    fn test_self_service_roles() {
        assert!(UserRole::Student.is_self_service());
        assert!(UserRole::Teacher.is_self_service());
        assert!(!UserRole::Admin.is_self_service());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User::new("Ada", "Ada@Example.com", Some("$2b$hash".into()), UserRole::Student);
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["enrolledCourseIds"], serde_json::json!([]));
        assert!(json.get("oauthProvider").is_none());
    }

    #[test]
    fn test_linked_user_has_no_password() {
        let user = User::linked("Ada", "ADA@example.com", UserRole::Teacher, "google", "sub-1");
        assert!(user.password_hash.is_none());
        assert!(user.is_linked_to("google", "sub-1"));
        assert!(!user.is_linked_to("google", "sub-2"));

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["oauthProvider"], "google");
        assert!(json.get("oauthId").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }
}
