//! HTTP side: serves the registry's current state to the scraper.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::registry::MetricRegistry;

const OPENMETRICS_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Binds the listen port and serves `/metrics` until process shutdown.
/// A bind failure propagates; it is the one fatal startup error.
pub async fn serve(port: u16, registry: Arc<MetricRegistry>) -> Result<()> {
    let app = Router::new()
        .route("/metrics", get(metrics))
        .with_state(registry);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    info!("adapter (PULL MODE) running on port {port}");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics(State(registry): State<Arc<MetricRegistry>>) -> impl IntoResponse {
    match registry.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("metrics encoding failed: {e}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_handler_renders_registry() {
        let registry = Arc::new(MetricRegistry::new());
        registry.set("tasmota_temperature_celsius", "station-a", 21.5);

        let response = metrics(State(registry)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("tasmota_temperature_celsius{sensor_id=\"station-a\"} 21.5"));
    }
}
