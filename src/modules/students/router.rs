use crate::modules::students::controller::{enroll_in_course, enrolled_courses, unenroll_from_course};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/enroll/{course_id}", post(enroll_in_course))
        .route("/unenroll/{course_id}", post(unenroll_from_course))
        .route("/enrolledCourses", get(enrolled_courses))
}
