use std::fmt;
use std::sync::Arc;

use lectern_auth::{GoogleIdTokenVerifier, IdentityProvider, UnconfiguredIdentityProvider};
use lectern_config::{
    CookieConfig, CorsConfig, DatabaseConfig, JwtConfig, OAuthConfig, StudioConfig,
};
use lectern_db::{DocumentStore, PgStore, StoreError, init_db_pool, run_migrations};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub jwt_config: JwtConfig,
    pub cookie_config: CookieConfig,
    pub cors_config: CorsConfig,
    pub studio_config: StudioConfig,
    pub identity_provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Build state around an existing store, reading the rest from the environment.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            jwt_config: JwtConfig::from_env(),
            cookie_config: CookieConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            studio_config: StudioConfig::from_env(),
            identity_provider: identity_provider_from_config(&OAuthConfig::from_env()),
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("cookie_config", &self.cookie_config)
            .field("cors_config", &self.cors_config)
            .field("studio_config", &self.studio_config)
            .field("identity_provider", &self.identity_provider.provider())
            .finish_non_exhaustive()
    }
}

/// Google sign-in when configured, otherwise a provider that refuses every token.
///
/// A broken key set is logged and disables sign-in rather than stopping startup.
pub fn identity_provider_from_config(config: &OAuthConfig) -> Arc<dyn IdentityProvider> {
    let Some((client_id, jwks_path)) = config.google() else {
        info!("Google sign-in disabled: GOOGLE_CLIENT_ID or GOOGLE_JWKS_PATH not set");
        return Arc::new(UnconfiguredIdentityProvider);
    };

    match GoogleIdTokenVerifier::from_jwks_file(client_id, jwks_path) {
        Ok(verifier) => {
            info!(jwks_path = %jwks_path.display(), "Google sign-in enabled");
            Arc::new(verifier)
        }
        Err(e) => {
            warn!(error = %e, "Google sign-in disabled");
            Arc::new(UnconfiguredIdentityProvider)
        }
    }
}

pub async fn init_app_state() -> Result<AppState, StoreError> {
    let pool = init_db_pool(&DatabaseConfig::from_env()).await?;
    run_migrations(&pool).await?;

    Ok(AppState::new(Arc::new(PgStore::new(pool))))
}
