//! Platform-version-specific construction of the radio configuration object.
//!
//! The radio primitive consumes an opaque [`SoftApConfiguration`]. Which
//! options it accepts depends on the platform API level, so construction goes
//! through a [`ConfigBuilder`] chosen once at startup by [`select_builder`].

use std::fmt;
use std::sync::Arc;

use crate::config::{
    Band, ConfigError, ConfigResult, HotspotConfig, MacRandomization, RadioSelection,
    SecurityMode,
};

/// Lowest platform API level with a local-only hotspot configuration builder.
pub const MIN_API_LEVEL: u32 = 30;

/// API level from which 60 GHz and MAC randomization control are available.
pub const API_LEVEL_60GHZ: u32 = 31;

/// API level from which every option is available.
pub const FULL_FEATURE_API_LEVEL: u32 = 33;

/// Opaque configuration handed to the radio primitive.
#[derive(Clone, PartialEq, Eq)]
pub struct SoftApConfiguration {
    ssid: String,
    passphrase: Option<String>,
    security_type: i32,
    band: u8,
    channel: Option<u16>,
    auto_shutdown: bool,
    mac_randomization: i32,
    api_level: u32,
}

impl SoftApConfiguration {
    /// Network name.
    #[must_use]
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Passphrase, absent for passphrase-less modes.
    #[must_use]
    pub fn passphrase(&self) -> Option<&str> {
        self.passphrase.as_deref()
    }

    /// Platform security type code.
    #[must_use]
    pub const fn security_type(&self) -> i32 {
        self.security_type
    }

    /// Platform band bits.
    #[must_use]
    pub const fn band(&self) -> u8 {
        self.band
    }

    /// Fixed channel, if any.
    #[must_use]
    pub const fn channel(&self) -> Option<u16> {
        self.channel
    }

    /// Whether the platform may shut the hotspot down when idle.
    #[must_use]
    pub const fn auto_shutdown(&self) -> bool {
        self.auto_shutdown
    }

    /// Platform MAC randomization code.
    #[must_use]
    pub const fn mac_randomization(&self) -> i32 {
        self.mac_randomization
    }

    /// API level of the builder that produced this object.
    #[must_use]
    pub const fn api_level(&self) -> u32 {
        self.api_level
    }
}

impl fmt::Debug for SoftApConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftApConfiguration")
            .field("ssid", &self.ssid)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .field("security_type", &self.security_type)
            .field("band", &self.band)
            .field("channel", &self.channel)
            .field("auto_shutdown", &self.auto_shutdown)
            .field("mac_randomization", &self.mac_randomization)
            .field("api_level", &self.api_level)
            .finish()
    }
}

/// Builds the platform configuration object for one platform-version variant.
pub trait ConfigBuilder: Send + Sync + fmt::Debug {
    /// API level this builder targets.
    fn api_level(&self) -> u32;

    /// Translate a validated configuration into the platform object.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the platform variant cannot express the
    /// configuration.
    fn build(&self, config: &HotspotConfig) -> ConfigResult<SoftApConfiguration>;
}

/// Builder for platforms that support every option.
#[derive(Debug, Clone, Copy)]
pub struct FullConfigBuilder {
    api_level: u32,
}

impl FullConfigBuilder {
    /// Create a builder for `api_level` (at least [`FULL_FEATURE_API_LEVEL`]).
    #[must_use]
    pub const fn new(api_level: u32) -> Self {
        Self { api_level }
    }
}

impl ConfigBuilder for FullConfigBuilder {
    fn api_level(&self) -> u32 {
        self.api_level
    }

    fn build(&self, config: &HotspotConfig) -> ConfigResult<SoftApConfiguration> {
        assemble(config, self.api_level)
    }
}

/// Builder for API levels 30-32.
///
/// Enhanced-open security is missing before 33; 60 GHz and MAC randomization
/// control are missing before 31.
#[derive(Debug, Clone, Copy)]
pub struct CompatConfigBuilder {
    api_level: u32,
}

impl CompatConfigBuilder {
    /// Create a builder for `api_level`.
    #[must_use]
    pub const fn new(api_level: u32) -> Self {
        Self { api_level }
    }

    fn require(&self, feature: impl fmt::Display, required: u32) -> ConfigResult<()> {
        if self.api_level >= required {
            Ok(())
        } else {
            Err(ConfigError::Unsupported {
                feature: feature.to_string(),
                required,
                api_level: self.api_level,
            })
        }
    }
}

impl ConfigBuilder for CompatConfigBuilder {
    fn api_level(&self) -> u32 {
        self.api_level
    }

    fn build(&self, config: &HotspotConfig) -> ConfigResult<SoftApConfiguration> {
        if config.security_mode().is_owe() {
            self.require(
                format_args!("Security mode {}", config.security_mode()),
                FULL_FEATURE_API_LEVEL,
            )?;
        }
        if config.radio().band().contains(Band::GHZ_60) {
            self.require("60 GHz band", API_LEVEL_60GHZ)?;
        }
        if config.mac_randomization() != MacRandomization::Persistent {
            self.require("MAC randomization setting", API_LEVEL_60GHZ)?;
        }
        assemble(config, self.api_level)
    }
}

/// Pick the builder matching the detected platform API level.
///
/// # Errors
///
/// Returns [`ConfigError::Unsupported`] below [`MIN_API_LEVEL`].
pub fn select_builder(api_level: u32) -> ConfigResult<Arc<dyn ConfigBuilder>> {
    match api_level {
        level if level >= FULL_FEATURE_API_LEVEL => Ok(Arc::new(FullConfigBuilder::new(level))),
        level if level >= MIN_API_LEVEL => Ok(Arc::new(CompatConfigBuilder::new(level))),
        level => Err(ConfigError::Unsupported {
            feature: "Local-only hotspot configuration".to_string(),
            required: MIN_API_LEVEL,
            api_level: level,
        }),
    }
}

fn assemble(config: &HotspotConfig, api_level: u32) -> ConfigResult<SoftApConfiguration> {
    let (band, channel) = match config.radio() {
        RadioSelection::Bands(band) => (band, None),
        RadioSelection::Channel { number, band } => {
            if !band.is_single() {
                return Err(ConfigError::PlatformBuild(format!(
                    "channel {number} must be paired with exactly one band, got {band}"
                )));
            }
            (band, Some(number))
        }
    };

    let passphrase = match config.security_mode() {
        SecurityMode::Open | SecurityMode::Wpa3Owe | SecurityMode::Wpa3OweTransition => None,
        _ => Some(config.passphrase().to_string()),
    };

    Ok(SoftApConfiguration {
        ssid: config.name().to_string(),
        passphrase,
        security_type: config.security_mode().code(),
        band: band.bits(),
        channel,
        auto_shutdown: config.auto_shutdown(),
        mac_randomization: config.mac_randomization().code(),
        api_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HotspotRequest;

    #[test]
    fn test_select_builder_by_api_level() {
        assert_eq!(select_builder(34).unwrap().api_level(), 34);
        assert_eq!(select_builder(30).unwrap().api_level(), 30);
        assert!(matches!(
            select_builder(29).unwrap_err(),
            ConfigError::Unsupported { required: 30, .. }
        ));
    }

    #[test]
    fn test_full_builder_maps_fields() {
        let config = HotspotRequest::new("Office", "other456")
            .band(Band::GHZ_5)
            .channel(44)
            .auto_shutdown(true)
            .mac_randomization(MacRandomization::NonPersistent)
            .build()
            .unwrap();
        let soft_ap = FullConfigBuilder::new(33).build(&config).unwrap();

        assert_eq!(soft_ap.ssid(), "Office");
        assert_eq!(soft_ap.passphrase(), Some("other456"));
        assert_eq!(soft_ap.security_type(), 1);
        assert_eq!(soft_ap.band(), Band::GHZ_5.bits());
        assert_eq!(soft_ap.channel(), Some(44));
        assert!(soft_ap.auto_shutdown());
        assert_eq!(soft_ap.mac_randomization(), 2);
    }

    #[test]
    fn test_owe_has_no_passphrase() {
        let config = HotspotRequest::new("Cafe", "")
            .security_mode(SecurityMode::Wpa3Owe)
            .build()
            .unwrap();
        let soft_ap = FullConfigBuilder::new(33).build(&config).unwrap();
        assert_eq!(soft_ap.passphrase(), None);
    }

    #[test]
    fn test_compat_builder_rejects_newer_options() {
        let owe = HotspotRequest::new("Cafe", "")
            .security_mode(SecurityMode::Wpa3OweTransition)
            .build()
            .unwrap();
        assert!(matches!(
            CompatConfigBuilder::new(32).build(&owe).unwrap_err(),
            ConfigError::Unsupported { required: 33, .. }
        ));

        let wigig = HotspotRequest::new("Fast", "secret123")
            .band(Band::GHZ_60)
            .build()
            .unwrap();
        assert!(CompatConfigBuilder::new(30).build(&wigig).is_err());
        assert!(CompatConfigBuilder::new(31).build(&wigig).is_ok());
    }

    #[test]
    fn test_debug_redacts_passphrase() {
        let config = HotspotRequest::new("Home", "secret123").build().unwrap();
        let soft_ap = FullConfigBuilder::new(33).build(&config).unwrap();
        assert!(!format!("{soft_ap:?}").contains("secret123"));
    }
}
