use crate::modules::courses::controller::{
    create_course, delete_course, get_course, list_courses, update_course,
};
use crate::modules::lessons::router::init_lessons_router;
use crate::state::AppState;
use axum::{Router, routing::get};

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route(
            "/{course_id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .nest("/{course_id}/lessons", init_lessons_router())
}
