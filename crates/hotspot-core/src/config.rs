//! Hotspot configuration building and validation.
//!
//! Turns the loosely-typed parameters a caller supplies (name, passphrase,
//! security mode, channel, band, auto-shutdown, MAC randomization) into an
//! immutable [`HotspotConfig`]. Every contradictory combination is rejected
//! here with a [`ConfigError`], so nothing invalid ever reaches the radio.

use std::fmt;
use std::ops::{BitOr, RangeInclusive};
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use utoipa::ToSchema;

/// Maximum SSID length in bytes (IEEE 802.11).
pub const MAX_SSID_BYTES: usize = 32;

/// Minimum WPA2/WPA3-transition passphrase length.
pub const MIN_PSK_LENGTH: usize = 8;

/// Maximum WPA2/WPA3-transition passphrase length.
pub const MAX_PSK_LENGTH: usize = 63;

/// Errors produced while building a hotspot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Both the network name and the passphrase were empty.
    #[error("SSID and Password cannot be empty")]
    EmptyNameAndPassphrase,

    /// The network name was empty.
    #[error("SSID cannot be empty")]
    EmptyName,

    /// The selected security mode requires a passphrase but none was given.
    #[error("Password cannot be empty for security mode {mode}")]
    EmptyPassphrase {
        /// Security mode that requires the passphrase.
        mode: SecurityMode,
    },

    /// The network name exceeds the 802.11 limit.
    #[error("SSID is {actual} bytes long, maximum is {max}")]
    NameTooLong {
        /// Maximum allowed length in bytes.
        max: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// A passphrase was supplied for a security mode that takes none.
    #[error("Security mode {mode} does not accept a passphrase")]
    UnexpectedPassphrase {
        /// The passphrase-less security mode.
        mode: SecurityMode,
    },

    /// The passphrase violates the rules of its security mode.
    #[error("Invalid passphrase for {mode}: {message}")]
    InvalidPassphrase {
        /// Security mode the passphrase was checked against.
        mode: SecurityMode,
        /// What was wrong with it.
        message: String,
    },

    /// The channel cannot be paired with the requested band(s).
    #[error("Channel {channel} is not valid for band {band}")]
    InvalidChannel {
        /// Requested channel number.
        channel: u16,
        /// Band mask the channel was checked against.
        band: Band,
    },

    /// A band mask was empty or used unknown bits.
    #[error("Invalid band mask: {0:#06b}")]
    InvalidBand(u8),

    /// A raw platform code did not map to a known value.
    #[error("Unknown {kind} code: {code}")]
    UnknownCode {
        /// Which enumeration was being decoded.
        kind: &'static str,
        /// The offending raw value.
        code: i32,
    },

    /// The option is not available on the running platform version.
    #[error("{feature} requires platform API level {required}, running {api_level}")]
    Unsupported {
        /// Human-readable name of the option.
        feature: String,
        /// API level the option needs.
        required: u32,
        /// API level that was detected.
        api_level: u32,
    },

    /// The platform configuration object could not be constructed.
    #[error("Failed to construct platform configuration: {0}")]
    PlatformBuild(String),
}

/// Result type for configuration building.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ============================================================================
// Security mode
// ============================================================================

/// Access point security mode.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// No authentication.
    Open,
    /// WPA2 personal.
    #[default]
    Wpa2Psk,
    /// WPA3 SAE with WPA2 fallback.
    Wpa3SaeTransition,
    /// WPA3 SAE only.
    Wpa3Sae,
    /// Enhanced open with plain open fallback.
    Wpa3OweTransition,
    /// Enhanced open (opportunistic wireless encryption).
    Wpa3Owe,
}

impl SecurityMode {
    /// Platform code for this mode.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Open => 0,
            Self::Wpa2Psk => 1,
            Self::Wpa3SaeTransition => 2,
            Self::Wpa3Sae => 3,
            Self::Wpa3OweTransition => 4,
            Self::Wpa3Owe => 5,
        }
    }

    /// Whether clients must present a passphrase.
    #[must_use]
    pub const fn requires_passphrase(self) -> bool {
        matches!(self, Self::Wpa2Psk | Self::Wpa3SaeTransition | Self::Wpa3Sae)
    }

    /// Whether this is one of the enhanced-open modes.
    #[must_use]
    pub const fn is_owe(self) -> bool {
        matches!(self, Self::Wpa3OweTransition | Self::Wpa3Owe)
    }
}

impl TryFrom<i32> for SecurityMode {
    type Error = ConfigError;

    fn try_from(code: i32) -> ConfigResult<Self> {
        match code {
            0 => Ok(Self::Open),
            1 => Ok(Self::Wpa2Psk),
            2 => Ok(Self::Wpa3SaeTransition),
            3 => Ok(Self::Wpa3Sae),
            4 => Ok(Self::Wpa3OweTransition),
            5 => Ok(Self::Wpa3Owe),
            code => Err(ConfigError::UnknownCode {
                kind: "security mode",
                code,
            }),
        }
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Wpa2Psk => "WPA2-PSK",
            Self::Wpa3SaeTransition => "WPA3-SAE-transition",
            Self::Wpa3Sae => "WPA3-SAE",
            Self::Wpa3OweTransition => "WPA3-OWE-transition",
            Self::Wpa3Owe => "WPA3-OWE",
        };
        f.write_str(name)
    }
}

// ============================================================================
// MAC randomization
// ============================================================================

/// Policy for randomizing the access point's hardware address.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MacRandomization {
    /// Use the factory MAC address.
    None,
    /// Randomized once and kept stable for this network.
    #[default]
    Persistent,
    /// Re-randomized on every activation.
    NonPersistent,
}

impl MacRandomization {
    /// Platform code for this setting.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Persistent => 1,
            Self::NonPersistent => 2,
        }
    }
}

impl TryFrom<i32> for MacRandomization {
    type Error = ConfigError;

    fn try_from(code: i32) -> ConfigResult<Self> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Persistent),
            2 => Ok(Self::NonPersistent),
            code => Err(ConfigError::UnknownCode {
                kind: "MAC randomization",
                code,
            }),
        }
    }
}

// ============================================================================
// Band
// ============================================================================

/// Bit-flag set of radio bands.
///
/// A `Band` is never empty and never carries bits outside the four known
/// bands; both [`Band::from_bits`] and deserialization enforce this.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Band(u8);

impl Band {
    /// 2.4 GHz.
    pub const GHZ_2: Self = Self(1 << 0);
    /// 5 GHz.
    pub const GHZ_5: Self = Self(1 << 1);
    /// 6 GHz.
    pub const GHZ_6: Self = Self(1 << 2);
    /// 60 GHz.
    pub const GHZ_60: Self = Self(1 << 3);
    /// Any band the radio supports.
    pub const ANY: Self = Self(0b1111);

    const SINGLE: [(Self, &'static str); 4] = [
        (Self::GHZ_2, "2ghz"),
        (Self::GHZ_5, "5ghz"),
        (Self::GHZ_6, "6ghz"),
        (Self::GHZ_60, "60ghz"),
    ];

    /// Build a band set from raw bits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBand`] for an empty mask or unknown bits.
    pub fn from_bits(bits: u8) -> ConfigResult<Self> {
        if bits == 0 || bits & !Self::ANY.0 != 0 {
            Err(ConfigError::InvalidBand(bits))
        } else {
            Ok(Self(bits))
        }
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every band in `other` is also in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether exactly one band is set.
    #[must_use]
    pub const fn is_single(self) -> bool {
        self.0.is_power_of_two()
    }

    /// Iterate over the single bands in this set, lowest frequency first.
    pub fn iter(self) -> impl Iterator<Item = Self> {
        Self::SINGLE
            .into_iter()
            .map(|(band, _)| band)
            .filter(move |band| self.contains(*band))
    }

    /// Valid channel numbers for a single band.
    #[must_use]
    pub fn channel_range(self) -> Option<RangeInclusive<u16>> {
        match self {
            Self::GHZ_2 => Some(1..=14),
            Self::GHZ_5 => Some(34..=196),
            Self::GHZ_6 => Some(1..=233),
            Self::GHZ_60 => Some(1..=6),
            _ => None,
        }
    }

    /// The band a channel implies within this set.
    ///
    /// For a single band this validates the pairing. For a multi-band set the
    /// lowest band whose channel range contains `channel` wins.
    #[must_use]
    pub fn implied_band_for_channel(self, channel: u16) -> Option<Self> {
        self.iter().find(|band| {
            band.channel_range()
                .is_some_and(|range| range.contains(&channel))
        })
    }
}

impl Default for Band {
    fn default() -> Self {
        Self::GHZ_2
    }
}

impl BitOr for Band {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ANY {
            return f.write_str("any");
        }
        let names: Vec<&str> = Self::SINGLE
            .iter()
            .filter(|(band, _)| self.contains(*band))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            write!(f, "{:#06b}", self.0)
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

impl fmt::Debug for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Band({self})")
    }
}

impl FromStr for Band {
    type Err = ConfigError;

    /// Parses `"any"`, a single band such as `"5ghz"`, or a `|`/`,` separated
    /// list such as `"2ghz|5ghz"`. Case-insensitive.
    fn from_str(s: &str) -> ConfigResult<Self> {
        let s = s.trim().to_ascii_lowercase();
        if s == "any" {
            return Ok(Self::ANY);
        }
        let mut bits = 0u8;
        for part in s.split(['|', ',']).map(str::trim) {
            let (band, _) = Self::SINGLE
                .iter()
                .find(|(_, name)| *name == part)
                .ok_or(ConfigError::InvalidBand(0))?;
            bits |= band.0;
        }
        Self::from_bits(bits)
    }
}

impl Serialize for Band {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Band {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BandVisitor;

        impl Visitor<'_> for BandVisitor {
            type Value = Band;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a band name like \"5ghz\", \"2ghz|5ghz\", \"any\", or a bit mask")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Band, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Band, E> {
                let bits = u8::try_from(v).map_err(E::custom)?;
                Band::from_bits(bits).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Band, E> {
                let bits = u8::try_from(v).map_err(E::custom)?;
                Band::from_bits(bits).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(BandVisitor)
    }
}

// ============================================================================
// Request
// ============================================================================

/// Fallback values for request fields the caller leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDefaults {
    /// Security mode when none is given.
    pub security_mode: SecurityMode,
    /// Band when none is given.
    pub band: Band,
    /// Auto-shutdown when unspecified.
    pub auto_shutdown: bool,
    /// MAC randomization when unspecified.
    pub mac_randomization: MacRandomization,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            security_mode: SecurityMode::Wpa2Psk,
            band: Band::GHZ_2,
            auto_shutdown: false,
            mac_randomization: MacRandomization::Persistent,
        }
    }
}

/// User-supplied parameters for a start request.
///
/// Optional fields fall back to [`RequestDefaults`] when the request is built.
#[derive(Clone, Default, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "name": "Home",
    "passphrase": "secret123",
    "security_mode": "wpa2_psk",
    "band": "2ghz"
}))]
pub struct HotspotRequest {
    /// Network name (SSID).
    #[schema(example = "Home")]
    pub name: String,

    /// Network passphrase. Empty for open and enhanced-open modes.
    #[serde(default, skip_serializing)]
    #[schema(example = "secret123")]
    pub passphrase: String,

    /// Security mode.
    #[serde(default)]
    pub security_mode: Option<SecurityMode>,

    /// Explicit channel; takes precedence over `band` for radio selection.
    #[serde(default)]
    #[schema(example = 6)]
    pub channel: Option<u16>,

    /// Band mask, e.g. `"2ghz"`, `"2ghz|5ghz"` or `"any"`.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "2ghz")]
    pub band: Option<Band>,

    /// Let the platform shut the hotspot down when no clients are connected.
    #[serde(default)]
    pub auto_shutdown: Option<bool>,

    /// MAC randomization policy.
    #[serde(default)]
    pub mac_randomization: Option<MacRandomization>,
}

impl HotspotRequest {
    /// Request with the given credentials and every other field defaulted.
    pub fn new(name: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passphrase: passphrase.into(),
            ..Self::default()
        }
    }

    /// Set the security mode.
    #[must_use]
    pub fn security_mode(mut self, mode: SecurityMode) -> Self {
        self.security_mode = Some(mode);
        self
    }

    /// Pin the access point to a channel.
    #[must_use]
    pub fn channel(mut self, channel: u16) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Set the band mask.
    #[must_use]
    pub fn band(mut self, band: Band) -> Self {
        self.band = Some(band);
        self
    }

    /// Enable or disable auto-shutdown.
    #[must_use]
    pub fn auto_shutdown(mut self, enabled: bool) -> Self {
        self.auto_shutdown = Some(enabled);
        self
    }

    /// Set the MAC randomization policy.
    #[must_use]
    pub fn mac_randomization(mut self, setting: MacRandomization) -> Self {
        self.mac_randomization = Some(setting);
        self
    }

    /// Fill every unset field from `defaults`.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &RequestDefaults) -> Self {
        self.security_mode.get_or_insert(defaults.security_mode);
        self.band.get_or_insert(defaults.band);
        self.auto_shutdown.get_or_insert(defaults.auto_shutdown);
        self.mac_randomization
            .get_or_insert(defaults.mac_randomization);
        self
    }

    /// Validate and build the immutable configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first problem found.
    pub fn build(self) -> ConfigResult<HotspotConfig> {
        HotspotConfig::build(self)
    }
}

impl fmt::Debug for HotspotRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotspotRequest")
            .field("name", &self.name)
            .field("passphrase", &"<redacted>")
            .field("security_mode", &self.security_mode)
            .field("channel", &self.channel)
            .field("band", &self.band)
            .field("auto_shutdown", &self.auto_shutdown)
            .field("mac_randomization", &self.mac_randomization)
            .finish()
    }
}

// ============================================================================
// Validated configuration
// ============================================================================

/// How the radio picks its operating frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioSelection {
    /// Let the platform choose a channel within these bands.
    Bands(Band),
    /// Fixed channel on a single band.
    Channel {
        /// Channel number.
        number: u16,
        /// The single band the channel belongs to.
        band: Band,
    },
}

impl RadioSelection {
    /// The band mask in effect.
    #[must_use]
    pub const fn band(self) -> Band {
        match self {
            Self::Bands(band) | Self::Channel { band, .. } => band,
        }
    }
}

/// Validated, immutable hotspot configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct HotspotConfig {
    name: String,
    passphrase: String,
    security_mode: SecurityMode,
    radio: RadioSelection,
    auto_shutdown: bool,
    mac_randomization: MacRandomization,
}

impl HotspotConfig {
    /// Validate a request. Unset fields take the built-in defaults
    /// (WPA2-PSK, 2 GHz, no auto-shutdown, persistent MAC randomization).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first problem found.
    pub fn build(request: HotspotRequest) -> ConfigResult<Self> {
        let security_mode = request.security_mode.unwrap_or_default();
        let band = request.band.unwrap_or_default();

        validate_credentials(&request.name, &request.passphrase, security_mode)?;

        let radio = match request.channel {
            Some(channel) => {
                let implied = band
                    .implied_band_for_channel(channel)
                    .ok_or(ConfigError::InvalidChannel { channel, band })?;
                RadioSelection::Channel {
                    number: channel,
                    band: implied,
                }
            }
            None => RadioSelection::Bands(band),
        };

        Ok(Self {
            name: request.name,
            passphrase: request.passphrase,
            security_mode,
            radio,
            auto_shutdown: request.auto_shutdown.unwrap_or_default(),
            mac_randomization: request.mac_randomization.unwrap_or_default(),
        })
    }

    /// Network name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Network passphrase (empty for passphrase-less modes).
    #[must_use]
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Security mode.
    #[must_use]
    pub const fn security_mode(&self) -> SecurityMode {
        self.security_mode
    }

    /// Channel or band selection.
    #[must_use]
    pub const fn radio(&self) -> RadioSelection {
        self.radio
    }

    /// Whether auto-shutdown is enabled.
    #[must_use]
    pub const fn auto_shutdown(&self) -> bool {
        self.auto_shutdown
    }

    /// MAC randomization policy.
    #[must_use]
    pub const fn mac_randomization(&self) -> MacRandomization {
        self.mac_randomization
    }
}

impl fmt::Debug for HotspotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotspotConfig")
            .field("name", &self.name)
            .field("passphrase", &"<redacted>")
            .field("security_mode", &self.security_mode)
            .field("radio", &self.radio)
            .field("auto_shutdown", &self.auto_shutdown)
            .field("mac_randomization", &self.mac_randomization)
            .finish()
    }
}

fn validate_credentials(name: &str, passphrase: &str, mode: SecurityMode) -> ConfigResult<()> {
    let needs_passphrase = mode.requires_passphrase();

    match (name.is_empty(), passphrase.is_empty() && needs_passphrase) {
        (true, true) => return Err(ConfigError::EmptyNameAndPassphrase),
        (true, false) => return Err(ConfigError::EmptyName),
        (false, true) => return Err(ConfigError::EmptyPassphrase { mode }),
        (false, false) => {}
    }

    if name.len() > MAX_SSID_BYTES {
        return Err(ConfigError::NameTooLong {
            max: MAX_SSID_BYTES,
            actual: name.len(),
        });
    }

    if !needs_passphrase {
        return if passphrase.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::UnexpectedPassphrase { mode })
        };
    }

    // SAE alone accepts arbitrary-length passwords; anything WPA2 clients
    // may join with must be a valid PSK passphrase.
    if mode != SecurityMode::Wpa3Sae {
        if !passphrase.is_ascii() {
            return Err(ConfigError::InvalidPassphrase {
                mode,
                message: "must contain only ASCII characters".to_string(),
            });
        }
        let len = passphrase.len();
        if !(MIN_PSK_LENGTH..=MAX_PSK_LENGTH).contains(&len) {
            return Err(ConfigError::InvalidPassphrase {
                mode,
                message: format!(
                    "must be {MIN_PSK_LENGTH}-{MAX_PSK_LENGTH} characters (got {len})"
                ),
            });
        }
    }

    Ok(())
}
