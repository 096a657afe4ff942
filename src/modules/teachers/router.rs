use crate::modules::teachers::controller::teacher_courses;
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn init_teachers_router() -> Router<AppState> {
    Router::new().route("/getCourses", get(teacher_courses))
}
