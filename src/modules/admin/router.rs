use crate::modules::admin::controller::reconcile_mirrors;
use crate::state::AppState;
use axum::{Router, routing::post};

pub fn init_admin_router() -> Router<AppState> {
    Router::new().route("/reconcile", post(reconcile_mirrors))
}
