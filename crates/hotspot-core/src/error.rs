//! Unified error types for the hotspot core library.
//!
//! [`HotspotError`] covers every failure a caller of the lifecycle controller
//! can observe. Configuration problems keep their detailed
//! [`ConfigError`](crate::config::ConfigError) as the source.
//!
//! # Design Principles
//!
//! - **Values, not panics**: every failure is returned or logged, never raised
//! - **Specific variants**: each variant captures exactly one failure mode
//! - **HTTP-ready**: variants carry an HTTP status code and a stable error code
//!
//! # Example
//!
//! ```rust
//! use hotspot_core::error::{HotspotError, Result};
//! use hotspot_core::HotspotRequest;
//!
//! fn validate(name: &str, passphrase: &str) -> Result<()> {
//!     HotspotRequest::new(name, passphrase).build()?;
//!     Ok(())
//! }
//!
//! assert!(validate("", "").unwrap_err().is_config_error());
//! ```

use thiserror::Error;

use crate::adapter::FailureReason;
use crate::config::ConfigError;

/// The unified error type for all hotspot operations.
#[derive(Debug, Error)]
pub enum HotspotError {
    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The requested configuration is invalid or unsupported.
    #[error("Invalid hotspot configuration: {0}")]
    Config(#[from] ConfigError),

    // =========================================================================
    // ACTIVATION ERRORS
    // =========================================================================
    /// The radio reported that activation failed.
    #[error("Hotspot activation failed: {0}")]
    ActivationFailed(FailureReason),

    /// The radio did not answer within the activation timeout.
    #[error("Hotspot activation timed out after {timeout_secs} seconds")]
    ActivationTimedOut {
        /// Timeout that elapsed.
        timeout_secs: u64,
    },

    /// A newer start request replaced this one before it completed.
    #[error("Hotspot activation superseded by a newer start request")]
    Superseded,

    /// A stop request cancelled this activation before it completed.
    #[error("Hotspot activation cancelled by a stop request")]
    Cancelled,

    // =========================================================================
    // RUNTIME ERRORS
    // =========================================================================
    /// The controller task is no longer running.
    #[error("Hotspot controller is not running")]
    ControllerUnavailable,

    /// Application settings could not be loaded or are invalid.
    #[error("Settings error: {0}")]
    Settings(String),

    /// A low-level I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized [`Result`] type for hotspot operations.
pub type Result<T> = std::result::Result<T, HotspotError>;

impl HotspotError {
    /// Returns `true` if the request was rejected before reaching the radio.
    #[inline]
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns `true` if the radio was asked and did not deliver a session.
    #[inline]
    #[must_use]
    pub const fn is_activation_error(&self) -> bool {
        matches!(
            self,
            Self::ActivationFailed(_) | Self::ActivationTimedOut { .. }
        )
    }

    /// Returns `true` for outcomes caused by the caller's own later requests
    /// rather than by a fault.
    #[inline]
    #[must_use]
    pub const fn is_expected_state(&self) -> bool {
        matches!(self, Self::Superseded | Self::Cancelled)
    }

    /// Returns `true` if simply trying again later may succeed.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::ActivationFailed(reason) => reason.is_transient(),
            Self::ActivationTimedOut { .. } => true,
            _ => false,
        }
    }

    /// Returns an HTTP-appropriate status code for this error.
    #[inline]
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::Config(ConfigError::Unsupported { .. }) => 422,
            Self::Config(_) => 400,

            // 403 Forbidden - policy refuses tethering
            Self::ActivationFailed(FailureReason::TetheringDisallowed) => 403,

            // 409 Conflict - overtaken by a later request
            Self::Superseded | Self::Cancelled => 409,

            // 503 Service Unavailable - radio or controller not usable
            Self::ActivationFailed(_) | Self::ControllerUnavailable => 503,

            // 504 Gateway Timeout - radio never answered
            Self::ActivationTimedOut { .. } => 504,

            // 500 Internal Server Error
            Self::Settings(_) | Self::IoError(_) => 500,
        }
    }

    /// Returns a machine-readable error code for API responses.
    #[inline]
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Config(ConfigError::Unsupported { .. }) => "CONFIG_UNSUPPORTED",
            Self::Config(_) => "CONFIG_INVALID",
            Self::ActivationFailed(FailureReason::Busy) => "RADIO_BUSY",
            Self::ActivationFailed(FailureReason::TetheringDisallowed) => "TETHERING_DISALLOWED",
            Self::ActivationFailed(_) => "ACTIVATION_FAILED",
            Self::ActivationTimedOut { .. } => "ACTIVATION_TIMED_OUT",
            Self::Superseded => "ACTIVATION_SUPERSEDED",
            Self::Cancelled => "ACTIVATION_CANCELLED",
            Self::ControllerUnavailable => "CONTROLLER_UNAVAILABLE",
            Self::Settings(_) => "SETTINGS_ERROR",
            Self::IoError(_) => "IO_ERROR",
        }
    }
}

impl From<::config::ConfigError> for HotspotError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Settings(err.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
