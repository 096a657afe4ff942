//! Session cookie attributes.
//!
//! The credential is delivered as an HttpOnly, SameSite=Strict cookie.
//! `Secure` is on unless `COOKIE_SECURE=false`, which local development over
//! plain HTTP needs.

use std::env;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    /// Cookie max-age in seconds.
    pub max_age: i64,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "token".to_string(),
            secure: true,
            max_age: crate::jwt::DEFAULT_EXPIRY_SECS,
        }
    }
}

impl CookieConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            name: env::var("COOKIE_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.name),
            secure: env::var("COOKIE_SECURE")
                .ok()
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.secure),
            max_age: env::var("JWT_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &i64| *secs > 0)
                .unwrap_or(defaults.max_age),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cookie_is_secure() {
        let config = CookieConfig::default();
        assert_eq!(config.name, "token");
        assert!(config.secure);
    }

    #[test]
    fn test_parse_bool() {
        assert!(!parse_bool("false"));
        assert!(!parse_bool(" OFF "));
        assert!(!parse_bool("0"));
        assert!(parse_bool("true"));
        assert!(parse_bool("yes"));
    }
}
