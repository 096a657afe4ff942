use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::modules::admin::router::init_admin_router;
use crate::modules::auth::router::init_auth_router;
use crate::modules::courses::router::init_courses_router;
use crate::modules::students::router::init_students_router;
use crate::modules::studios::router::init_studios_router;
use crate::modules::teachers::router::init_teachers_router;
use crate::state::AppState;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::routing::get;
use axum::{Json, Router, middleware};
use lectern_core::AppError;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Liveness, including a store round trip
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and store reachable", body = HealthResponse),
        (status = 503, description = "Store unavailable", body = lectern_core::ErrorResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<HealthResponse>), AppError> {
    state.store().ping().await?;
    Ok((
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
        }),
    ))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(health_check))
        .nest(
            "/api",
            Router::new()
                .nest("/admin", init_admin_router())
                .nest("/auth", init_auth_router())
                .nest("/courses", init_courses_router())
                .nest("/student", init_students_router())
                .nest("/teacher", init_teachers_router())
                .nest("/studios", init_studios_router()),
        )
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
