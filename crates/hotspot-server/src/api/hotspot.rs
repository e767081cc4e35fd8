//! Hotspot lifecycle API endpoints.
//!
//! Starting waits for the radio to answer, so a successful response means the
//! access point is up. Stopping is idempotent. Tether state changes can be
//! followed live over server-sent events.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use hotspot_core::{ActiveSession, HotspotRequest, HotspotStatus, StopOutcome};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::api::error::{ApiResult, ErrorResponse};
use crate::state::SharedState;

/// Name of the SSE event carrying the tether state.
pub const TETHER_STATE_EVENT: &str = "tether_state";

/// Creates the hotspot router with all endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(get_status))
        .route("/start", post(start_hotspot))
        .route("/stop", post(stop_hotspot))
        .route("/events", get(tether_events))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response after a stop request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "outcome": "stopped",
    "active": false
}))]
pub struct StopResponse {
    /// What the request did.
    pub outcome: StopOutcome,

    /// Whether a session is live afterwards.
    #[schema(example = false)]
    pub active: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the current hotspot status.
#[utoipa::path(
    get,
    path = "/api/hotspot",
    tag = "hotspot",
    operation_id = "getHotspotStatus",
    summary = "Get hotspot status",
    description = "Returns the controller phase and, while active, the live session.",
    responses(
        (status = 200, description = "Status retrieved", body = HotspotStatus),
        (status = 503, description = "Controller not running", body = ErrorResponse)
    )
)]
pub async fn get_status(State(state): State<SharedState>) -> ApiResult<Json<HotspotStatus>> {
    Ok(Json(state.controller.status().await?))
}

/// Start a local-only hotspot.
///
/// Any running session is stopped first.
#[utoipa::path(
    post,
    path = "/api/hotspot/start",
    tag = "hotspot",
    operation_id = "startHotspot",
    summary = "Start the hotspot",
    description = "Validates the network name and passphrase, stops any running \
        session, then asks the radio for a new access point and waits for it \
        to come up. Omitted fields use the configured defaults.",
    request_body = HotspotRequest,
    responses(
        (status = 200, description = "Hotspot started", body = ActiveSession),
        (status = 400, description = "Invalid name, passphrase, channel or band", body = ErrorResponse),
        (status = 403, description = "Tethering disallowed by policy", body = ErrorResponse),
        (status = 409, description = "Overtaken by a later request", body = ErrorResponse),
        (status = 422, description = "Not supported on this platform version", body = ErrorResponse),
        (status = 503, description = "Radio could not start the hotspot", body = ErrorResponse),
        (status = 504, description = "Radio did not answer in time", body = ErrorResponse)
    )
)]
pub async fn start_hotspot(
    State(state): State<SharedState>,
    Json(request): Json<HotspotRequest>,
) -> ApiResult<Json<ActiveSession>> {
    info!(ssid = %request.name, "Start requested via API");
    let session = state.controller.start(request).await?;
    Ok(Json(session))
}

/// Stop the hotspot.
#[utoipa::path(
    post,
    path = "/api/hotspot/stop",
    tag = "hotspot",
    operation_id = "stopHotspot",
    summary = "Stop the hotspot",
    description = "Stops the running session or cancels a pending start. \
        Succeeds with `already_stopped` when nothing is running.",
    responses(
        (status = 200, description = "Hotspot stopped", body = StopResponse),
        (status = 503, description = "Controller not running", body = ErrorResponse)
    )
)]
pub async fn stop_hotspot(State(state): State<SharedState>) -> ApiResult<Json<StopResponse>> {
    let outcome = state.controller.stop().await?;
    info!(?outcome, "Stop requested via API");

    Ok(Json(StopResponse {
        outcome,
        active: state.controller.tether_state(),
    }))
}

/// Stream tether state changes.
#[utoipa::path(
    get,
    path = "/api/hotspot/events",
    tag = "hotspot",
    operation_id = "streamTetherState",
    summary = "Follow tether state",
    description = "Server-sent events named `tether_state` with data `true` or \
        `false`. The first event carries the current state.",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = String)
    )
)]
pub async fn tether_events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = state.controller.subscribe().map(|active| {
        Ok::<_, Infallible>(
            Event::default()
                .event(TETHER_STATE_EVENT)
                .data(active.to_string()),
        )
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}
