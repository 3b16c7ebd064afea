use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::routes::{self, AppState};

/// Build the application router with its middleware stack
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", routes::router(state))
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(60)))
}

pub async fn run(state: AppState) -> Result<()> {
    let port = state.config.server.port;
    let app = app(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("CineSky API running at http://localhost:{}", port);
    axum::serve(listener, app)
        .await
        .context("Server terminated")?;
    Ok(())
}
