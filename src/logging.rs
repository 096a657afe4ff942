use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::{KeyValue, global, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer},
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_DIR: &str = "storage/logs";

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let request_id = uuid::Uuid::new_v4().to_string();

    info!(
        request_id = %request_id,
        method = %method,
        path = %matched_path,
        "Incoming request"
    );

    let response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    match status {
        400..=499 => warn!(
            request_id = %request_id,
            method = %method,
            path = %matched_path,
            status,
            latency_ms = %latency_ms,
            "Client error"
        ),
        500..=599 => error!(
            request_id = %request_id,
            method = %method,
            path = %matched_path,
            status,
            latency_ms = %latency_ms,
            "Server error"
        ),
        _ => info!(
            request_id = %request_id,
            method = %method,
            path = %matched_path,
            status,
            latency_ms = %latency_ms,
            "Request completed"
        ),
    }

    response
}

fn otel_enabled() -> bool {
    std::env::var("OTEL_ENABLED")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1"))
        .unwrap_or(false)
}

fn init_tracer() -> Result<Tracer, TraceError> {
    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());

    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new(vec![
        KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new(
            "environment",
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        ),
    ]);

    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(otlp_endpoint);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .install_batch(runtime::Tokio)
}

/// Installs the global subscriber.
///
/// Console output is filtered by `RUST_LOG`. Errors go to a daily
/// `lectern.log`, and everything at INFO and above goes to a daily
/// `lectern.json` under `storage/logs`. Spans are exported over OTLP when
/// `OTEL_ENABLED=true`.
pub fn init_tracing() {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::fmt;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=info,lectern_db=info,tower_http=warn,hyper=info,tonic=info",
            env!("CARGO_CRATE_NAME")
        ))
    });

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_filter(console_filter);

    let (file_layer, json_layer) = match std::fs::create_dir_all(LOG_DIR) {
        Ok(()) => {
            let file_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "lectern.log");
            let file_layer = fmt::layer()
                .with_writer(file_appender)
                .with_target(false)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new("error"));

            let json_appender = RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "lectern.json");
            let json_layer = fmt::layer()
                .json()
                .with_writer(json_appender)
                .with_current_span(true)
                .with_span_list(true)
                .with_filter(EnvFilter::new("info"));

            (Some(file_layer), Some(json_layer))
        }
        Err(e) => {
            eprintln!("Failed to create {}: {}. File logging disabled.", LOG_DIR, e);
            (None, None)
        }
    };

    let otel_layer = if otel_enabled() {
        match init_tracer() {
            Ok(tracer) => Some(tracing_opentelemetry::layer().with_tracer(tracer)),
            Err(e) => {
                eprintln!("Failed to initialize OpenTelemetry: {}. Continuing without it.", e);
                None
            }
        }
    } else {
        None
    };
    let otel_active = otel_layer.is_some();

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(json_layer)
        .with(otel_layer)
        .init();

    info!(otel = otel_active, "Tracing initialized");
}

pub async fn shutdown_tracer() {
    info!("Shutting down OpenTelemetry tracer");
    global::shutdown_tracer_provider();
}
