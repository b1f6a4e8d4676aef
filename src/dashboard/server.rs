use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::CorsLayer;

use super::api::{self, AppState};
use super::ws;
use crate::review::ReviewController;

/// Configuration for the dashboard server.
pub struct ServerConfig {
    pub port: u16,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3142,
            dev_mode: false,
        }
    }
}

/// Build the full application router with API and WebSocket routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router()
        .route("/ws", get(ws::ws_handler))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": format!("No route for {}", uri.path())})),
    )
}

/// Start the dashboard server and block until Ctrl+C.
///
/// Every review still running at shutdown is cancelled.
pub async fn start_server(config: ServerConfig, controller: ReviewController) -> Result<()> {
    let state = Arc::new(AppState {
        controller: controller.clone(),
    });

    let mut app = build_router(state);
    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if config.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    println!("taskdeck dashboard running at http://{}", local_addr);
    tracing::info!(%local_addr, dev_mode = config.dev_mode, "dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    let cancelled = controller.cancel_all();
    if cancelled > 0 {
        tracing::info!(cancelled, "cancelled running reviews on shutdown");
    }
    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ReviewError;
    use crate::review::{ProjectId, ReviewBackend, ReviewReport, ReviewTimings};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    struct InstantBackend;

    #[async_trait]
    impl ReviewBackend for InstantBackend {
        async fn review(&self, _project_id: ProjectId) -> Result<ReviewReport, ReviewError> {
            Ok(ReviewReport::new(55, "halfway there"))
        }
    }

    fn test_router() -> (Router, ReviewController) {
        let controller = ReviewController::new(
            Arc::new(InstantBackend),
            ReviewTimings {
                settle: Duration::from_millis(5),
                ..ReviewTimings::default()
            },
        );
        let state = Arc::new(AppState {
            controller: controller.clone(),
        });
        (build_router(state), controller)
    }

    #[tokio::test]
    async fn test_health_via_full_router() {
        let (app, _) = test_router();
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (app, _) = test_router();
        let req = Request::builder()
            .uri("/some/client/route")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["error"].as_str().unwrap().contains("/some/client/route"));
    }

    #[tokio::test]
    async fn test_review_completes_through_router() {
        let (app, controller) = test_router();
        let req = Request::builder()
            .method("POST")
            .uri("/api/reviews/12")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        tokio::time::timeout(Duration::from_secs(5), controller.wait_settled(12))
            .await
            .unwrap();

        let req = Request::builder()
            .uri("/api/reviews/12")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["phase"], "completed");
        assert_eq!(json["progress"], 55);
        assert_eq!(json["comment"], "halfway there");
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3142);
        assert!(!config.dev_mode);
    }
}
