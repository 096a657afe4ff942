use crate::state::AppState;
use axum::{Router, routing::post};

use super::controller::{google_login, login_user, logout_user, register_user, verify_user};

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login_user))
        .route("/google", post(google_login))
        .route("/logout", post(logout_user))
        .route("/verify", post(verify_user))
}
