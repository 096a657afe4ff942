//! Authentication request and response bodies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::users::{User, UserRole};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[validate(email)]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    /// `student` (default) or `teacher`
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    #[schema(example = "password123")]
    pub password: String,
}

/// Sign in with an ID token issued by Google.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GoogleLoginRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    /// Role for a first-time sign-in: `student` (default) or `teacher`
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// Role the caller expects to hold
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
