use crate::middleware::role::{RequireTeacher, RequireTeacherOrAdmin};
use crate::modules::courses::model::{
    Course, CourseListResponse, CourseMessageResponse, CourseSearch, CreateCourseDto,
    MessageResponse, PageParams, UpdateCourseDto,
};
use crate::modules::courses::service::CourseService;
use crate::state::AppState;
use crate::validator::{ValidPath, ValidQuery, ValidatedJson};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use lectern_core::{AppError, ErrorResponse};
use lectern_models::CourseId;
use tracing::instrument;

#[utoipa::path(
    get,
    path = "/api/courses",
    params(
        PageParams,
        CourseSearch
    ),
    responses(
        (status = 200, description = "Page of courses, newest first", body = CourseListResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn list_courses(
    State(state): State<AppState>,
    ValidQuery(params): ValidQuery<PageParams>,
    ValidQuery(search): ValidQuery<CourseSearch>,
) -> Result<Json<CourseListResponse>, AppError> {
    let page = CourseService::list_courses(state.store(), &params, search.term()).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}",
    params(
        ("course_id" = CourseId, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course", body = Course),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    ValidPath(course_id): ValidPath<CourseId>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::get_course(state.store(), course_id).await?;
    Ok(Json(course))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = CourseMessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - teachers only", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Courses"
)]
#[instrument(skip(state, dto))]
pub async fn create_course(
    State(state): State<AppState>,
    RequireTeacher(principal): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<CourseMessageResponse>), AppError> {
    let course = CourseService::create_course(state.store(), &principal, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(CourseMessageResponse {
            message: "Course created successfully".to_string(),
            course,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/courses/{course_id}",
    params(
        ("course_id" = CourseId, Path, description = "Course ID")
    ),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated", body = CourseMessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Courses"
)]
#[instrument(skip(state, dto))]
pub async fn update_course(
    State(state): State<AppState>,
    RequireTeacherOrAdmin(principal): RequireTeacherOrAdmin,
    ValidPath(course_id): ValidPath<CourseId>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<CourseMessageResponse>, AppError> {
    let course = CourseService::update_course(state.store(), &principal, course_id, dto).await?;
    Ok(Json(CourseMessageResponse {
        message: "Course updated successfully".to_string(),
        course,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{course_id}",
    params(
        ("course_id" = CourseId, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course, its lessons and enrollments removed", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn delete_course(
    State(state): State<AppState>,
    RequireTeacherOrAdmin(principal): RequireTeacherOrAdmin,
    ValidPath(course_id): ValidPath<CourseId>,
) -> Result<Json<MessageResponse>, AppError> {
    CourseService::delete_course(state.store(), &principal, course_id).await?;
    Ok(Json(MessageResponse::new("Course deleted successfully")))
}
