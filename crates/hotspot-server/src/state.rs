//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hotspot_core::{
    select_builder, spawn_notification_bridge, HotspotController, HotspotRadio,
    LogNotificationSurface, Notification, Settings,
};
use tracing::info;

/// State handle passed to every handler.
pub type SharedState = Arc<AppState>;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// The hotspot lifecycle controller.
    pub controller: HotspotController,
    /// Settings the server was started with.
    pub settings: Settings,
    /// When the server started.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Spawn the controller over `radio` and the notification bridge that
    /// follows it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured platform API level has no
    /// configuration builder.
    pub fn new(settings: Settings, radio: Arc<dyn HotspotRadio>) -> anyhow::Result<SharedState> {
        let builder = select_builder(settings.controller.platform_api_level)?;
        let controller = HotspotController::spawn(radio, builder, settings.controller_options());

        spawn_notification_bridge(
            &controller.state_watch(),
            Arc::new(LogNotificationSurface),
            Notification::from_settings(&settings.notification),
        );

        info!(
            api_level = settings.controller.platform_api_level,
            timeout_secs = settings.controller.activation_timeout_secs,
            "Hotspot controller ready"
        );

        Ok(Arc::new(Self {
            controller,
            settings,
            started_at: Utc::now(),
        }))
    }

    /// State backed by the in-process simulated radio.
    ///
    /// # Errors
    ///
    /// See [`AppState::new`].
    #[cfg(feature = "simulated-radio")]
    pub fn simulated(settings: Settings) -> anyhow::Result<SharedState> {
        Self::new(settings, Arc::new(hotspot_core::SimulatedRadio::new()))
    }
}
