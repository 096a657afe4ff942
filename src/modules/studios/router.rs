use crate::modules::studios::controller::{create_studio, get_studio_by_invite_code};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_studios_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_studio))
        .route("/{invite_code}", get(get_studio_by_invite_code))
}
