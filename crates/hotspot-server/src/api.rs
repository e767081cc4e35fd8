//! HTTP API routes and handlers.
//!
//! This module contains all HTTP endpoint implementations organized by domain:
//! - `health` - Service health checks
//! - `hotspot` - Hotspot start, stop, status and state events
//! - `error` - API error types
//! - `openapi` - OpenAPI specification generation

use axum::routing::get;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub mod error;
pub mod health;
pub mod hotspot;
pub mod openapi;

// Re-export commonly used types
pub use error::{ApiError, ApiResult, ErrorResponse};

// Re-export OpenAPI utilities for the gen-openapi binary
pub use openapi::get_openapi_json;

/// Creates the combined API router with all endpoints.
///
/// # Route Structure
///
/// ```text
/// /health                - Health check
/// /api
/// ├── /hotspot           - Status snapshot
/// │   ├── /start         - Start (waits for the radio)
/// │   ├── /stop          - Stop (idempotent)
/// │   └── /events        - Tether state as server-sent events
/// └── /openapi.json      - OpenAPI specification
/// ```
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .nest(
            "/api",
            Router::new()
                // OpenAPI spec at /api/openapi.json
                .route("/openapi.json", get(openapi::get_openapi_spec))
                // Hotspot lifecycle
                .nest("/hotspot", hotspot::router()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(all(test, feature = "simulated-radio"))]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use hotspot_core::Settings;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::state::AppState;

    fn app() -> Router {
        create_router(AppState::simulated(Settings::default()).unwrap())
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["tethering"], false);
    }

    #[tokio::test]
    async fn test_start_then_stop() {
        let app = app();

        let (status, session) = send(
            &app,
            "POST",
            "/api/hotspot/start",
            Some(json!({ "name": "Home", "passphrase": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["name"], "Home");
        assert_eq!(session["security_mode"], "wpa2_psk");
        assert!(session.get("passphrase").is_none());

        let (status, body) = send(&app, "GET", "/api/hotspot", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "active");
        assert_eq!(body["session"]["session_id"], session["session_id"]);

        let (status, body) = send(&app, "POST", "/api/hotspot/stop", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "stopped");
        assert_eq!(body["active"], false);

        let (_, body) = send(&app, "POST", "/api/hotspot/stop", None).await;
        assert_eq!(body["outcome"], "already_stopped");
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/hotspot/start",
            Some(json!({ "name": "", "passphrase": "" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "config_invalid");
        assert_eq!(body["message"], "SSID and Password cannot be empty");

        let (_, body) = send(&app, "GET", "/api/hotspot", None).await;
        assert_eq!(body["phase"], "idle");
    }

    #[tokio::test]
    async fn test_unsupported_on_old_platform() {
        let mut settings = Settings::default();
        settings.controller.platform_api_level = 30;
        let app = create_router(AppState::simulated(settings).unwrap());

        let (status, body) = send(
            &app,
            "POST",
            "/api/hotspot/start",
            Some(json!({ "name": "Cafe", "passphrase": "", "security_mode": "wpa3_owe" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "config_unsupported");
    }

    #[tokio::test]
    async fn test_events_stream_content_type() {
        let app = app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/hotspot/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn test_openapi_served() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["info"]["title"], "hotspot API");
    }
}
