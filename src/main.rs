use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use lectern::logging::{init_tracing, shutdown_tracer};
use lectern::metrics::{init_metrics, metrics_app};
use lectern::router::init_router;
use lectern::state::init_app_state;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let metrics_handle = init_metrics();

    let state = init_app_state()
        .await
        .context("failed to initialize application state")?;

    let mut app = init_router(state);
    if let Some(handle) = metrics_handle {
        app = app.merge(metrics_app(handle));
    }

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(%addr, "Server running");
    info!("Swagger UI available at http://localhost:{}/swagger-ui", port);
    info!("Scalar UI available at http://localhost:{}/scalar", port);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    shutdown_tracer().await;
    served.context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
