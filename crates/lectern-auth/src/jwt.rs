//! JWT utilities for session credentials.
//!
//! Credentials are HS256-signed and carry the subject user id and the role
//! held at issue time. Verification checks signature and expiry only.
//!
//! # Example
//!
//! ```ignore
//! use lectern_auth::{create_access_token, verify_token};
//! use lectern_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "student", &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use lectern_config::JwtConfig;
use lectern_core::AppError;

use crate::claims::Claims;

/// Issues a session credential for `user_id`.
///
/// # Errors
///
/// Returns an infrastructure error if encoding fails.
pub fn create_access_token(
    user_id: Uuid,
    role: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.expiry as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::infrastructure(anyhow::anyhow!("Failed to create token: {}", e)))
}

/// Verifies a credential and returns its claims.
///
/// # Errors
///
/// Returns an unauthenticated error for a bad signature, an expired token or
/// a malformed token. The message never says which.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Not authorized"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::ErrorKind;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            expiry: 3600,
        }
    }

    #[test]
    fn test_create_and_verify() {
        let user_id = Uuid::new_v4();
        let token = create_access_token(user_id, "teacher", &config()).unwrap();

        let claims = verify_token(&token, &config()).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "teacher");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_unauthenticated() {
        let token = create_access_token(Uuid::new_v4(), "student", &config()).unwrap();
        let other = JwtConfig {
            secret: "different".to_string(),
            expiry: 3600,
        };

        let err = verify_token(&token, &other).unwrap_err();
        assert!(err.is(ErrorKind::Unauthenticated));
        assert_eq!(err.public_message(), "Not authorized");
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: "student".to_string(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config().secret.as_bytes()),
        )
        .unwrap();

        let err = verify_token(&token, &config()).unwrap_err();
        assert!(err.is(ErrorKind::Unauthenticated));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_token("not.a.jwt", &config()).is_err());
    }
}
