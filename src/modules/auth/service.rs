use anyhow::anyhow;
use lectern_auth::{IdentityError, IdentityProvider, create_access_token};
use lectern_config::JwtConfig;
use lectern_core::{AppError, hash_password, verify_password};
use lectern_db::DocumentStore;
use lectern_models::{User, UserRole, normalize_email};
use tracing::instrument;

use super::model::{AuthResponse, GoogleLoginRequest, LoginRequest, RegisterRequest};
use crate::audit_event;
use crate::metrics::{track_jwt_issued, track_login, track_user_registered};
use crate::middleware::auth::Principal;
use crate::security_event;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const EXTERNAL_AUTH_FAILED: &str = "Authentication failed";

/// Result of signing in through an external identity provider.
#[derive(Debug)]
pub struct LinkedLogin {
    pub response: AuthResponse,
    /// `true` when this sign-in created the account.
    pub created: bool,
}

/// Outcome of checking a principal against a requested role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleCheck {
    Verified,
    Mismatch,
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(store, jwt_config, dto), fields(email = %dto.email))]
    pub async fn register(
        store: &dyn DocumentStore,
        jwt_config: &JwtConfig,
        dto: RegisterRequest,
    ) -> Result<AuthResponse, AppError> {
        let role = dto.role.unwrap_or_default();
        if !role.is_self_service() {
            return Err(AppError::unprocessable(anyhow!(
                "Role must be student or teacher"
            )));
        }

        let email = normalize_email(&dto.email);
        if store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }

        let password_hash = hash_password(&dto.password)?;
        let user = User::new(dto.name.trim(), email, Some(password_hash), role);

        store.insert_user(&user).await.map_err(|e| {
            if e.is_duplicate_key() {
                AppError::conflict("Email already registered")
            } else {
                AppError::from(e)
            }
        })?;

        let token = create_access_token(user.id.into_inner(), role.as_str(), jwt_config)?;

        audit_event!("register", "user", user.id = %user.id, user.role = %role, "User registered");
        track_user_registered(role.as_str());
        track_jwt_issued();

        Ok(AuthResponse { token, user })
    }

    #[instrument(skip(store, jwt_config, dto), fields(email = %dto.email))]
    pub async fn login(
        store: &dyn DocumentStore,
        jwt_config: &JwtConfig,
        dto: LoginRequest,
    ) -> Result<AuthResponse, AppError> {
        let email = normalize_email(&dto.email);
        let user = store.find_user_by_email(&email).await?;

        let Some((user, hash)) = user.and_then(|u| {
            let hash = u.password_hash.clone()?;
            Some((u, hash))
        }) else {
            security_event!("auth.login_failed", reason = "unknown_email", "Login failed");
            track_login(false);
            return Err(AppError::bad_request(anyhow!(INVALID_CREDENTIALS)));
        };

        if !verify_password(&dto.password, &hash)? {
            security_event!(
                "auth.login_failed",
                user.id = %user.id,
                reason = "bad_password",
                "Login failed"
            );
            track_login(false);
            return Err(AppError::bad_request(anyhow!(INVALID_CREDENTIALS)));
        }

        let token = create_access_token(user.id.into_inner(), user.role.as_str(), jwt_config)?;

        track_login(true);
        track_jwt_issued();

        Ok(AuthResponse { token, user })
    }

    /// Signs in with a token from an external identity provider.
    ///
    /// The first sign-in for a subject creates a password-less account with
    /// the requested role. Later sign-ins find that account by subject and
    /// ignore the requested role. An email already held by another account
    /// is never linked implicitly.
    #[instrument(skip_all, fields(provider = provider.provider()))]
    pub async fn oauth_login(
        store: &dyn DocumentStore,
        provider: &dyn IdentityProvider,
        jwt_config: &JwtConfig,
        dto: GoogleLoginRequest,
    ) -> Result<LinkedLogin, AppError> {
        let role = dto.role.unwrap_or_default();
        if !role.is_self_service() {
            return Err(AppError::unprocessable(anyhow!(
                "Role must be student or teacher"
            )));
        }

        let identity = match provider.verify(&dto.token).await {
            Ok(identity) => identity,
            Err(IdentityError::Rejected(reason)) => {
                security_event!(
                    "auth.oauth_rejected",
                    provider = provider.provider(),
                    reason = %reason,
                    "External sign-in rejected"
                );
                track_login(false);
                return Err(AppError::unauthorized(EXTERNAL_AUTH_FAILED));
            }
            Err(e) => return Err(AppError::infrastructure(e)),
        };

        let provider_name = provider.provider();
        if let Some(user) = store.find_user_by_oauth(provider_name, &identity.subject).await? {
            return Self::linked_login(user, false, jwt_config);
        }

        let email = normalize_email(&identity.email);
        if store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }

        let user = User::linked(identity.name.trim(), email, role, provider_name, &identity.subject);
        match store.insert_user(&user).await {
            Ok(()) => {
                audit_event!(
                    "register",
                    "user",
                    user.id = %user.id,
                    user.role = %role,
                    provider = provider_name,
                    "User registered through external sign-in"
                );
                track_user_registered(role.as_str());
                Self::linked_login(user, true, jwt_config)
            }
            // A concurrent first sign-in for the same subject won the insert.
            Err(e) if e.duplicate_field() == Some("oauth_id") => {
                let user = store
                    .find_user_by_oauth(provider_name, &identity.subject)
                    .await?
                    .ok_or_else(|| {
                        AppError::infrastructure(anyhow!("Linked account missing after conflict"))
                    })?;
                Self::linked_login(user, false, jwt_config)
            }
            Err(e) if e.is_duplicate_key() => Err(AppError::conflict("Email already registered")),
            Err(e) => Err(AppError::from(e)),
        }
    }

    fn linked_login(
        user: User,
        created: bool,
        jwt_config: &JwtConfig,
    ) -> Result<LinkedLogin, AppError> {
        let token = create_access_token(user.id.into_inner(), user.role.as_str(), jwt_config)?;

        track_login(true);
        track_jwt_issued();

        Ok(LinkedLogin {
            response: AuthResponse { token, user },
            created,
        })
    }

    /// Compares the stored role with the role a client asked about.
    ///
    /// No requested role means any authenticated principal verifies. A name
    /// that is not a role never matches.
    pub fn verify_role(principal: &Principal, requested: Option<&str>) -> RoleCheck {
        match requested.map(str::trim).filter(|r| !r.is_empty()) {
            None => RoleCheck::Verified,
            Some(requested) => match requested.parse::<UserRole>() {
                Ok(role) if role == principal.role => RoleCheck::Verified,
                _ => RoleCheck::Mismatch,
            },
        }
    }
}
