use anyhow::anyhow;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use lectern_config::CookieConfig;
use lectern_core::{AppError, ErrorKind, ErrorResponse};
use tracing::instrument;

use super::model::{
    AuthResponse, GoogleLoginRequest, LoginRequest, MessageResponse, RegisterRequest,
    VerifyRequest, VerifyResponse,
};
use super::service::{AuthService, RoleCheck};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Non-HttpOnly marker cookie so browser code can tell a session exists.
const LOGGED_IN_COOKIE: &str = "isLoggedIn";

fn session_cookies(jar: CookieJar, config: &CookieConfig, token: &str) -> CookieJar {
    let session = Cookie::build((config.name.clone(), token.to_string()))
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::seconds(config.max_age));

    let marker = Cookie::build((LOGGED_IN_COOKIE, "true"))
        .http_only(false)
        .secure(config.secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::seconds(config.max_age));

    jar.add(session).add(marker)
}

/// Register a new student or teacher
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered, session cookie set", body = AuthResponse),
        (status = 400, description = "Email already registered or malformed body", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, dto))]
pub async fn register_user(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let response = AuthService::register(state.store(), &state.jwt_config, dto).await?;
    let jar = session_cookies(jar, &state.cookie_config, &response.token);
    Ok((StatusCode::CREATED, jar, Json(response)))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = AuthResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, dto))]
pub async fn login_user(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let response = AuthService::login(state.store(), &state.jwt_config, dto).await?;
    let jar = session_cookies(jar, &state.cookie_config, &response.token);
    Ok((jar, Json(response)))
}

/// Sign in with a Google ID token
///
/// Creates the account on first sign-in. `role` only applies then.
#[utoipa::path(
    post,
    path = "/api/auth/google",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Signed in to an existing account", body = AuthResponse),
        (status = 201, description = "Account created and signed in", body = AuthResponse),
        (status = 400, description = "Email already registered or malformed body", body = ErrorResponse),
        (status = 401, description = "Token rejected", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Sign-in not configured or store unavailable", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, dto))]
pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<GoogleLoginRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), AppError> {
    let login = AuthService::oauth_login(
        state.store(),
        state.identity_provider.as_ref(),
        &state.jwt_config,
        dto,
    )
    .await?;

    let jar = session_cookies(jar, &state.cookie_config, &login.response.token);
    let status = if login.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, jar, Json(login.response)))
}

/// Clear the session cookies
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar))]
pub async fn logout_user(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar
        .remove(Cookie::build((state.cookie_config.name.clone(), "")).path("/"))
        .remove(Cookie::build((LOGGED_IN_COOKIE, "")).path("/"));

    (jar, Json(MessageResponse::new("Logged out successfully")))
}

/// Check the session and, optionally, that it holds a given role
#[utoipa::path(
    post,
    path = "/api/auth/verify",
    request_body(content = VerifyRequest, description = "Optional role to check"),
    responses(
        (status = 200, description = "Session valid", body = VerifyResponse),
        (status = 401, description = "No valid session", body = VerifyResponse),
        (status = 403, description = "Role does not match", body = VerifyResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Authentication"
)]
#[instrument(skip(auth_user, body))]
pub async fn verify_user(
    auth_user: Result<AuthUser, AppError>,
    body: Bytes,
) -> Result<(StatusCode, Json<VerifyResponse>), AppError> {
    let auth_user = match auth_user {
        Ok(auth_user) => auth_user,
        Err(e) if e.is(ErrorKind::Infrastructure) => return Err(e),
        Err(_) => {
            return Ok((
                StatusCode::UNAUTHORIZED,
                Json(VerifyResponse { verified: false }),
            ));
        }
    };

    let request: VerifyRequest = if body.is_empty() {
        VerifyRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| AppError::bad_request(anyhow!("Invalid request body")))?
    };

    match AuthService::verify_role(auth_user.principal(), request.role.as_deref()) {
        RoleCheck::Verified => Ok((StatusCode::OK, Json(VerifyResponse { verified: true }))),
        RoleCheck::Mismatch => Ok((
            StatusCode::FORBIDDEN,
            Json(VerifyResponse { verified: false }),
        )),
    }
}
