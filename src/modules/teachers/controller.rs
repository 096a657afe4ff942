use crate::middleware::role::RequireTeacher;
use crate::modules::teachers::model::TeacherCoursesResponse;
use crate::modules::teachers::service::TeacherService;
use crate::state::AppState;
use axum::{Json, extract::State};
use lectern_core::{AppError, ErrorResponse};
use tracing::instrument;

/// The calling teacher's courses with their enrolled students
#[utoipa::path(
    get,
    path = "/api/teacher/getCourses",
    responses(
        (status = 200, description = "Courses taught by the caller", body = TeacherCoursesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Access denied. Not a teacher.", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Teachers"
)]
#[instrument(skip(state))]
pub async fn teacher_courses(
    State(state): State<AppState>,
    RequireTeacher(principal): RequireTeacher,
) -> Result<Json<TeacherCoursesResponse>, AppError> {
    let courses = TeacherService::dashboard(state.store(), &principal).await?;
    Ok(Json(TeacherCoursesResponse { courses }))
}
