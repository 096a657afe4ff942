use crate::middleware::role::RequireStudent;
use crate::modules::students::model::{CoursesResponse, MessageResponse};
use crate::modules::students::service::EnrollmentService;
use crate::state::AppState;
use crate::validator::ValidPath;
use axum::{Json, extract::State};
use lectern_core::{AppError, ErrorResponse};
use lectern_models::CourseId;
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/student/enroll/{course_id}",
    params(
        ("course_id" = CourseId, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Enrolled", body = MessageResponse),
        (status = 400, description = "Already enrolled in this course", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 503, description = "Store unavailable, retry", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn enroll_in_course(
    State(state): State<AppState>,
    RequireStudent(principal): RequireStudent,
    ValidPath(course_id): ValidPath<CourseId>,
) -> Result<Json<MessageResponse>, AppError> {
    EnrollmentService::enroll(state.store(), &principal, course_id).await?;
    Ok(Json(MessageResponse::new("Enrolled successfully")))
}

#[utoipa::path(
    post,
    path = "/api/student/unenroll/{course_id}",
    params(
        ("course_id" = CourseId, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Unenrolled, or was not enrolled", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 503, description = "Store unavailable, retry", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn unenroll_from_course(
    State(state): State<AppState>,
    RequireStudent(principal): RequireStudent,
    ValidPath(course_id): ValidPath<CourseId>,
) -> Result<Json<MessageResponse>, AppError> {
    EnrollmentService::unenroll(state.store(), &principal, course_id).await?;
    Ok(Json(MessageResponse::new("Unenrolled successfully")))
}

#[utoipa::path(
    get,
    path = "/api/student/enrolledCourses",
    responses(
        (status = 200, description = "Courses the student is enrolled in", body = CoursesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse),
        (status = 503, description = "Store unavailable, retry", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn enrolled_courses(
    State(state): State<AppState>,
    RequireStudent(principal): RequireStudent,
) -> Result<Json<CoursesResponse>, AppError> {
    let courses = EnrollmentService::enrolled_courses(state.store(), &principal).await?;
    Ok(Json(CoursesResponse { courses }))
}
