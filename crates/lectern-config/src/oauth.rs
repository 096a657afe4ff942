use std::env;
use std::path::PathBuf;

/// Google sign-in settings. Sign-in stays disabled until both are set.
#[derive(Clone, Debug, Default)]
pub struct OAuthConfig {
    /// OAuth client id that ID tokens must be issued for.
    pub google_client_id: Option<String>,
    /// JSON Web Key Set used to check token signatures.
    pub google_jwks_path: Option<PathBuf>,
}

impl OAuthConfig {
    pub fn from_env() -> Self {
        Self {
            google_client_id: non_empty("GOOGLE_CLIENT_ID"),
            google_jwks_path: non_empty("GOOGLE_JWKS_PATH").map(PathBuf::from),
        }
    }

    pub fn google(&self) -> Option<(&str, &PathBuf)> {
        Some((self.google_client_id.as_deref()?, self.google_jwks_path.as_ref()?))
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_needs_both_values() {
        let mut config = OAuthConfig {
            google_client_id: Some("client.apps.googleusercontent.com".to_string()),
            google_jwks_path: None,
        };
        assert!(config.google().is_none());

        config.google_jwks_path = Some(PathBuf::from("/etc/lectern/google-jwks.json"));
        let (client_id, _) = config.google().unwrap();
        assert_eq!(client_id, "client.apps.googleusercontent.com");
    }
}
