//! Shared types and OpenAPI schemas.
//!
//! Snapshots of controller state handed out to collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::adapter::ActivationId;
use crate::config::{HotspotConfig, SecurityMode};

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No session and nothing pending.
    Idle,
    /// Waiting for the radio to answer an activation.
    Starting,
    /// A session handle is held.
    Active,
}

/// Description of the live hotspot session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "session_id": "01936f4e-7b6a-7c3e-9a55-1c2b3d4e5f60",
    "activation": 1,
    "name": "Home",
    "security_mode": "wpa2_psk",
    "band": "2ghz",
    "channel": null,
    "started_at_utc": "2025-01-15T03:30:00Z"
}))]
pub struct ActiveSession {
    /// Unique id of this session.
    pub session_id: Uuid,

    /// Activation that produced the session.
    #[schema(value_type = u64, example = 1)]
    pub activation: ActivationId,

    /// Network name.
    #[schema(example = "Home")]
    pub name: String,

    /// Security mode in effect.
    pub security_mode: SecurityMode,

    /// Band mask in effect.
    #[schema(example = "2ghz")]
    pub band: String,

    /// Fixed channel, if one was requested.
    pub channel: Option<u16>,

    /// When the radio confirmed the session (UTC).
    pub started_at_utc: DateTime<Utc>,
}

impl ActiveSession {
    /// Describe a session that just started for `config`.
    #[must_use]
    pub fn new(activation: ActivationId, config: &HotspotConfig) -> Self {
        let channel = match config.radio() {
            crate::config::RadioSelection::Channel { number, .. } => Some(number),
            crate::config::RadioSelection::Bands(_) => None,
        };
        Self {
            session_id: Uuid::now_v7(),
            activation,
            name: config.name().to_string(),
            security_mode: config.security_mode(),
            band: config.radio().band().to_string(),
            channel,
            started_at_utc: Utc::now(),
        }
    }
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "active": false,
    "phase": "starting",
    "pending_activation": 2,
    "session": null
}))]
pub struct HotspotStatus {
    /// Whether a session handle is held.
    pub active: bool,

    /// Current lifecycle phase.
    pub phase: Phase,

    /// Activation being waited on, while starting.
    #[schema(value_type = Option<u64>)]
    pub pending_activation: Option<ActivationId>,

    /// The live session, while active.
    pub session: Option<ActiveSession>,
}

/// What a stop request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    /// A live session was closed.
    Stopped,
    /// A pending activation was abandoned; its session is closed on arrival.
    CancelledPending,
    /// Nothing was running.
    AlreadyStopped,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HotspotRequest;

    #[test]
    fn test_active_session_from_config() {
        let config = HotspotRequest::new("Home", "secret123")
            .channel(6)
            .build()
            .unwrap();
        let session = ActiveSession::new(ActivationId::default(), &config);
        assert_eq!(session.name, "Home");
        assert_eq!(session.band, "2ghz");
        assert_eq!(session.channel, Some(6));
    }

    #[test]
    fn test_status_serialization() {
        let status = HotspotStatus {
            active: false,
            phase: Phase::Idle,
            pending_activation: None,
            session: None,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"phase\":\"idle\""));
        assert!(json.contains("\"active\":false"));
    }

    #[test]
    fn test_stop_outcome_serialization() {
        let json = serde_json::to_string(&StopOutcome::AlreadyStopped).unwrap();
        assert_eq!(json, "\"already_stopped\"");
    }
}
