//! Application settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `HOTSPOT__*` environment variables (`HOTSPOT__CONTROLLER__ACTIVATION_TIMEOUT_SECS=30`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RequestDefaults;
use crate::controller::{ControllerOptions, DEFAULT_ACTIVATION_TIMEOUT};
use crate::error::{HotspotError, Result};
use crate::notification::NotificationSettings;
use crate::platform::FULL_FEATURE_API_LEVEL;

/// Controller tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Seconds an activation may stay unanswered.
    pub activation_timeout_secs: u64,
    /// Platform API level used to pick the configuration builder.
    pub platform_api_level: u32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            activation_timeout_secs: DEFAULT_ACTIVATION_TIMEOUT.as_secs(),
            platform_api_level: FULL_FEATURE_API_LEVEL,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to listen on.
    pub bind_addr: String,
    /// Production mode: JSON file logging.
    pub production: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            production: false,
        }
    }
}

/// All application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Controller tunables.
    pub controller: ControllerSettings,
    /// Values for fields a start request leaves out.
    pub defaults: RequestDefaults,
    /// Notification text.
    pub notification: NotificationSettings,
    /// HTTP server.
    pub server: ServerSettings,
}

impl Settings {
    /// Load from the default path and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or environment holds invalid values.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path` (if it exists) and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or environment holds invalid values.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading settings");
        let settings: Self = Config::builder()
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("HOTSPOT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Default settings file location.
    ///
    /// On Linux: `/etc/hotspot/config.toml`.
    /// Elsewhere: the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no config directory can be determined.
    pub fn default_path() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            Ok(PathBuf::from("/etc/hotspot/config.toml"))
        }
        #[cfg(not(target_os = "linux"))]
        {
            let dirs = directories::ProjectDirs::from("", "", "hotspot").ok_or_else(|| {
                HotspotError::Settings("Cannot determine config directory".into())
            })?;
            Ok(dirs.config_dir().join("config.toml"))
        }
    }

    /// Check values that deserialize fine but cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Settings`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.controller.activation_timeout_secs == 0 {
            return Err(HotspotError::Settings(
                "controller.activation_timeout_secs must be greater than zero".into(),
            ));
        }
        self.bind_addr()?;
        Ok(())
    }

    /// Parsed server bind address.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Settings`] if the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind_addr.parse().map_err(|e| {
            HotspotError::Settings(format!(
                "server.bind_addr {:?} is not a socket address: {e}",
                self.server.bind_addr
            ))
        })
    }

    /// Activation timeout as a [`Duration`].
    #[must_use]
    pub const fn activation_timeout(&self) -> Duration {
        Duration::from_secs(self.controller.activation_timeout_secs)
    }

    /// Options for [`HotspotController::spawn`](crate::HotspotController::spawn).
    #[must_use]
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            activation_timeout: self.activation_timeout(),
            defaults: self.defaults,
        }
    }

    /// Render as TOML, e.g. to seed a settings file.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Settings`] if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| HotspotError::Settings(e.to_string()))
    }
}
