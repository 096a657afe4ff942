use crate::middleware::role::{RequireStudent, RequireTeacher};
use crate::modules::studios::model::{CreateStudioDto, CreateStudioResponse, StudioResponse};
use crate::modules::studios::service::StudioService;
use crate::state::AppState;
use crate::validator::{ValidPath, ValidatedJson};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use lectern_core::{AppError, ErrorResponse};
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/studios",
    request_body = CreateStudioDto,
    responses(
        (status = 201, description = "Studio created with a shareable link", body = CreateStudioResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - teachers only", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Studios"
)]
#[instrument(skip(state, dto))]
pub async fn create_studio(
    State(state): State<AppState>,
    RequireTeacher(principal): RequireTeacher,
    ValidatedJson(dto): ValidatedJson<CreateStudioDto>,
) -> Result<(StatusCode, Json<CreateStudioResponse>), AppError> {
    let studio = StudioService::create_studio(state.store(), &principal, dto).await?;
    let studio_link = state.studio_config.link_for(&studio.invite_code);

    Ok((
        StatusCode::CREATED,
        Json(CreateStudioResponse {
            message: "Studio created successfully".to_string(),
            studio_link,
            studio,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/studios/{invite_code}",
    params(
        ("invite_code" = String, Path, description = "Studio invite code")
    ),
    responses(
        (status = 200, description = "Studio with its host", body = StudioResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse),
        (status = 404, description = "Studio not found", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Studios"
)]
#[instrument(skip(state))]
pub async fn get_studio_by_invite_code(
    State(state): State<AppState>,
    RequireStudent(principal): RequireStudent,
    ValidPath(invite_code): ValidPath<String>,
) -> Result<Json<StudioResponse>, AppError> {
    let studio = StudioService::get_by_invite_code(state.store(), &principal, &invite_code).await?;
    Ok(Json(StudioResponse { studio }))
}
