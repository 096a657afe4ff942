use crate::modules::lessons::controller::{
    create_lesson, delete_lesson, get_lesson, list_lessons, update_lesson,
};
use crate::state::AppState;
use axum::{Router, routing::get};

/// Mounted under `/courses/{course_id}/lessons`.
pub fn init_lessons_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_lessons).post(create_lesson))
        .route(
            "/{lesson_id}",
            get(get_lesson).put(update_lesson).delete(delete_lesson),
        )
}
