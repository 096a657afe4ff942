use crate::audit_event;
use crate::middleware::role::RequireAdmin;
use crate::modules::students::model::ReconcileReport;
use crate::modules::students::service::EnrollmentService;
use crate::state::AppState;
use axum::{Json, extract::State};
use lectern_core::{AppError, ErrorResponse};
use tracing::instrument;

/// Repair every user's enrollment and course-ownership mirrors
///
/// Same pass as `lectern-cli reconcile`. Per-user failures are counted in
/// the report rather than failing the request.
#[utoipa::path(
    post,
    path = "/api/admin/reconcile",
    responses(
        (status = 200, description = "Reconciliation finished", body = ReconcileReport),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Access denied. Admin role required.", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
#[instrument(skip(state))]
pub async fn reconcile_mirrors(
    State(state): State<AppState>,
    RequireAdmin(principal): RequireAdmin,
) -> Result<Json<ReconcileReport>, AppError> {
    let report = EnrollmentService::reconcile_all(state.store()).await?;

    audit_event!(
        "reconcile",
        "users",
        admin.id = %principal.id,
        users_checked = report.users_checked,
        failures = report.failures,
        "Mirror reconciliation run"
    );

    Ok(Json(report))
}
