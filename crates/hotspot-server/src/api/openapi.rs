//! OpenAPI specification generation for the hotspot API.
//!
//! The document is served at `/api/openapi.json` and written to disk by the
//! `gen-openapi` binary for client generation.

use axum::Json;
use hotspot_core::{
    ActiveSession, HotspotRequest, HotspotStatus, MacRandomization, Phase, SecurityMode,
    StopOutcome,
};
use utoipa::OpenApi;

use super::error::ErrorResponse;
use super::health::HealthResponse;
use super::hotspot::StopResponse;

/// Serve the OpenAPI specification as JSON.
pub async fn get_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Returns the OpenAPI specification as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn get_openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

/// Main OpenAPI document structure for the hotspot API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "hotspot API",
        version = "0.1.0",
        description = r#"
# hotspot API

Start, stop and observe a local-only Wi-Fi access point.

## Overview

- **Start**: validates the network name and passphrase, stops any running
  session, then waits for the radio to bring the new access point up.
- **Stop**: closes the running session or cancels a pending start. Always safe
  to call.
- **Events**: a server-sent event stream of the tether state, starting with the
  current value.

At most one session is ever live. A start request made while another start is
still pending supersedes it.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local hotspot server")
    ),
    tags(
        (
            name = "system",
            description = "Health checks"
        ),
        (
            name = "hotspot",
            description = "Local-only hotspot lifecycle"
        )
    ),
    paths(
        super::health::health_check,
        super::hotspot::get_status,
        super::hotspot::start_hotspot,
        super::hotspot::stop_hotspot,
        super::hotspot::tether_events,
    ),
    components(
        schemas(
            // Error types
            ErrorResponse,
            // Health types
            HealthResponse,
            // Hotspot types
            HotspotRequest,
            SecurityMode,
            MacRandomization,
            ActiveSession,
            HotspotStatus,
            Phase,
            StopOutcome,
            StopResponse,
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generation() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "hotspot API");
        assert!(spec.paths.paths.contains_key("/api/hotspot/start"));
        assert!(spec.paths.paths.contains_key("/health"));
    }

    #[test]
    fn test_openapi_json_serialization() {
        let json = get_openapi_json().unwrap();
        assert!(json.contains("\"openapi\":"));
        assert!(json.contains("\"hotspot API\""));
        assert!(json.contains("startHotspot"));
    }
}
