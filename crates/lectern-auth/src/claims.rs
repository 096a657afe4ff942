use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims embedded in a session credential.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    /// Role at the time the credential was issued
    pub role: String,
    /// Expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_serialize() {
        let claims = Claims {
            sub: "user-id-123".to_string(),
            role: "student".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""sub":"user-id-123""#));
        assert!(serialized.contains(r#""role":"student""#));
    }

    #[test]
    fn test_claims_deserialize() {
        let json = r#"{"sub":"user-id-456","role":"teacher","exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "user-id-456");
        assert_eq!(claims.role, "teacher");
        assert_eq!(claims.exp, 9999999999);
    }

    #[test]
    fn test_claims_without_role_rejected() {
        let json = r#"{"sub":"user-id-456","exp":9999999999,"iat":9999999900}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }
}
