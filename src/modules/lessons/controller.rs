use crate::middleware::auth::AuthUser;
use crate::modules::lessons::model::{
    CreateLessonDto, LessonMessageResponse, LessonResponse, LessonsResponse, MessageResponse,
    UpdateLessonDto,
};
use crate::modules::lessons::service::LessonService;
use crate::state::AppState;
use crate::validator::{ValidPath, ValidatedJson};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use lectern_core::{AppError, ErrorResponse};
use lectern_models::{CourseId, LessonId};
use tracing::instrument;

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/lessons",
    params(
        ("course_id" = CourseId, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Lessons of the course", body = LessonsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the owner, an enrolled student or an admin", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lessons"
)]
#[instrument(skip(state))]
pub async fn list_lessons(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidPath(course_id): ValidPath<CourseId>,
) -> Result<Json<LessonsResponse>, AppError> {
    let lessons = LessonService::list_lessons(state.store(), auth_user.principal(), course_id).await?;
    Ok(Json(LessonsResponse { lessons }))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/lessons/{lesson_id}",
    params(
        ("course_id" = CourseId, Path, description = "Course ID"),
        ("lesson_id" = LessonId, Path, description = "Lesson ID")
    ),
    responses(
        (status = 200, description = "Lesson", body = LessonResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the owner, an enrolled student or an admin", body = ErrorResponse),
        (status = 404, description = "Lesson not found for this course", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lessons"
)]
#[instrument(skip(state))]
pub async fn get_lesson(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidPath((course_id, lesson_id)): ValidPath<(CourseId, LessonId)>,
) -> Result<Json<LessonResponse>, AppError> {
    let lesson =
        LessonService::get_lesson(state.store(), auth_user.principal(), course_id, lesson_id)
            .await?;
    Ok(Json(LessonResponse { lesson }))
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/lessons",
    params(
        ("course_id" = CourseId, Path, description = "Course ID")
    ),
    request_body = CreateLessonDto,
    responses(
        (status = 201, description = "Lesson created", body = LessonMessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lessons"
)]
#[instrument(skip(state, dto))]
pub async fn create_lesson(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidPath(course_id): ValidPath<CourseId>,
    ValidatedJson(dto): ValidatedJson<CreateLessonDto>,
) -> Result<(StatusCode, Json<LessonMessageResponse>), AppError> {
    let lesson =
        LessonService::create_lesson(state.store(), auth_user.principal(), course_id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(LessonMessageResponse {
            message: "Lesson created successfully".to_string(),
            lesson,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/courses/{course_id}/lessons/{lesson_id}",
    params(
        ("course_id" = CourseId, Path, description = "Course ID"),
        ("lesson_id" = LessonId, Path, description = "Lesson ID")
    ),
    request_body = UpdateLessonDto,
    responses(
        (status = 200, description = "Lesson updated", body = LessonMessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Lesson not found for this course", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lessons"
)]
#[instrument(skip(state, dto))]
pub async fn update_lesson(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidPath((course_id, lesson_id)): ValidPath<(CourseId, LessonId)>,
    ValidatedJson(dto): ValidatedJson<UpdateLessonDto>,
) -> Result<Json<LessonMessageResponse>, AppError> {
    let lesson = LessonService::update_lesson(
        state.store(),
        auth_user.principal(),
        course_id,
        lesson_id,
        dto,
    )
    .await?;
    Ok(Json(LessonMessageResponse {
        message: "Lesson updated successfully".to_string(),
        lesson,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{course_id}/lessons/{lesson_id}",
    params(
        ("course_id" = CourseId, Path, description = "Course ID"),
        ("lesson_id" = LessonId, Path, description = "Lesson ID")
    ),
    responses(
        (status = 200, description = "Lesson deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Lesson not found for this course", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Lessons"
)]
#[instrument(skip(state))]
pub async fn delete_lesson(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidPath((course_id, lesson_id)): ValidPath<(CourseId, LessonId)>,
) -> Result<Json<MessageResponse>, AppError> {
    LessonService::delete_lesson(state.store(), auth_user.principal(), course_id, lesson_id)
        .await?;
    Ok(Json(MessageResponse::new("Lesson deleted successfully")))
}
