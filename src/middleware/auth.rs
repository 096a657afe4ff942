use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use lectern_auth::verify_token;
use lectern_config::JwtConfig;
use lectern_core::AppError;
use lectern_db::DocumentStore;
use lectern_models::{UserId, UserRole};

use crate::security_event;
use crate::state::AppState;
use crate::utils::tracing::record_user_id;

const NOT_AUTHORIZED: &str = "Not authorized";

/// The authenticated caller, with the role read from the store on this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub role: UserRole,
}

/// Pulls the credential from the session cookie, falling back to a bearer header.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Resolves a credential to a [`Principal`].
///
/// The role in the credential is ignored for authorization; the stored user
/// document decides. A user that no longer exists is unauthenticated, and a
/// store failure is reported as infrastructure rather than as a denial.
pub async fn resolve_principal(
    store: &dyn DocumentStore,
    jwt_config: &JwtConfig,
    token: &str,
) -> Result<Principal, AppError> {
    let claims = verify_token(token, jwt_config)?;

    let user_id: UserId = claims
        .sub
        .parse()
        .map_err(|_| AppError::unauthorized(NOT_AUTHORIZED))?;

    let user = store.find_user(user_id).await?.ok_or_else(|| {
        security_event!("auth.unknown_subject", user.id = %user_id, "Credential for missing user");
        AppError::unauthorized(NOT_AUTHORIZED)
    })?;

    if claims.role != user.role.as_str() {
        security_event!(
            "auth.stale_role",
            user.id = %user.id,
            token_role = %claims.role,
            stored_role = %user.role,
            "Credential role differs from stored role"
        );
    }

    Ok(Principal {
        id: user.id,
        role: user.role,
    })
}

/// Extractor that authenticates the request and yields its [`Principal`].
///
/// The principal is cached in request extensions so stacking extractors
/// costs a single store read.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Principal);

impl AuthUser {
    pub fn id(&self) -> UserId {
        self.0.id
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }

    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(AuthUser(*principal));
        }

        let token = extract_token(&parts.headers, &state.cookie_config.name)
            .ok_or_else(|| AppError::unauthorized(NOT_AUTHORIZED))?;

        let principal = resolve_principal(state.store(), &state.jwt_config, &token).await?;
        record_user_id(&principal.id.to_string());
        parts.extensions.insert(principal);

        Ok(AuthUser(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use lectern_auth::create_access_token;
    use lectern_core::ErrorKind;
    use lectern_db::{MemoryStore, StoreOp};
    use lectern_models::User;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "resolver-test-secret".to_string(),
            expiry: 3600,
        }
    }

    #[test]
    fn test_cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token=from-cookie"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(
            extract_token(&headers, "token").as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn test_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(
            extract_token(&headers, "token").as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn test_no_credential() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_token(&headers, "token").is_none());
    }

    #[tokio::test]
    async fn test_role_comes_from_store() {
        let store = MemoryStore::new();
        let user = User::new("Sam", "sam@example.com", None, UserRole::Student);
        store.insert_user(&user).await.unwrap();

        let token = create_access_token(user.id.into_inner(), "student", &jwt_config()).unwrap();
        store.edit_user(user.id, |u| u.role = UserRole::Teacher);

        let principal = resolve_principal(&store, &jwt_config(), &token)
            .await
            .unwrap();
        assert_eq!(principal.role, UserRole::Teacher);
        assert_eq!(store.calls(StoreOp::FindUser), 1);
    }

    #[tokio::test]
    async fn test_deleted_user_is_unauthenticated() {
        let store = MemoryStore::new();
        let token = create_access_token(UserId::new().into_inner(), "student", &jwt_config())
            .unwrap();

        let err = resolve_principal(&store, &jwt_config(), &token)
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Unauthenticated));
    }

    #[tokio::test]
    async fn test_store_failure_is_infrastructure() {
        let store = MemoryStore::new();
        let token = create_access_token(UserId::new().into_inner(), "student", &jwt_config())
            .unwrap();
        store.fail_next(StoreOp::FindUser);

        let err = resolve_principal(&store, &jwt_config(), &token)
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Infrastructure));
    }
}
