use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if observability is enabled via OBSERVABILITY_ENABLED env var
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Initialize the Prometheus recorder and its upkeep task.
///
/// Returns None if observability is disabled or the recorder could not be
/// installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5,
                10.0,
            ],
        )
        .and_then(|builder| builder.install_recorder());

    let handle = match handle {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder not installed");
            return None;
        }
    };

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

/// Metrics middleware to track HTTP requests
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router for metrics server
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn track_user_registered(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_registered_total", "role" => role.to_string()).increment(1);
}

pub fn track_login(success: bool) {
    if !is_observability_enabled() {
        return;
    }
    let status = if success { "success" } else { "failure" };
    counter!("user_logins_total", "status" => status).increment(1);
}

pub fn track_jwt_issued() {
    if !is_observability_enabled() {
        return;
    }
    counter!("jwt_tokens_issued_total").increment(1);
}

/// Role or ownership denial
pub fn track_authorization_denied(reason: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("authorization_denied_total", "reason" => reason).increment(1);
}

/// `outcome` is one of `success`, `conflict` or `partial`.
pub fn track_enrollment(outcome: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("enrollments_total", "outcome" => outcome).increment(1);
}

pub fn track_unenrollment() {
    if !is_observability_enabled() {
        return;
    }
    counter!("unenrollments_total").increment(1);
}

/// Mirror entries added or removed by repair-on-read or reconciliation
pub fn track_mirror_repair(kind: &'static str, count: usize) {
    if !is_observability_enabled() || count == 0 {
        return;
    }
    counter!("mirror_repairs_total", "kind" => kind).increment(count as u64);
}

pub fn track_course_deleted(lessons_removed: u64) {
    if !is_observability_enabled() {
        return;
    }
    counter!("courses_deleted_total").increment(1);
    counter!("lessons_cascade_deleted_total").increment(lessons_removed);
}
