use std::env;

/// Seven days, matching the session cookie lifetime.
pub const DEFAULT_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Credential lifetime in seconds.
    pub expiry: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "your-secret-key-change-in-production".to_string(),
            expiry: DEFAULT_EXPIRY_SECS,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            secret: env::var("JWT_SECRET").unwrap_or(defaults.secret),
            expiry: env::var("JWT_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &i64| *secs > 0)
                .unwrap_or(defaults.expiry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_expiry_is_seven_days() {
        assert_eq!(JwtConfig::default().expiry, 604_800);
    }
}
