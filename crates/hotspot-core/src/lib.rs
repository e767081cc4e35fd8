//! # hotspot-core
//!
//! Core lifecycle logic for a local-only Wi-Fi access point.
//!
//! This crate provides:
//! - Validated hotspot configuration (name, passphrase, security mode, band)
//! - Platform-version-specific construction of the radio configuration
//! - A lifecycle controller that keeps at most one session live
//! - An observable tether state stream and the notification it drives
//!
//! ## Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`config`] - Request parameters, defaults and validation
//! - [`platform`] - Radio configuration builders per platform API level
//! - [`adapter`] - Uniform start/stop surface over the radio primitive
//! - [`controller`] - The lifecycle state machine
//! - [`publisher`] - Observable tether state
//! - [`notification`] - Foreground notification driven by the tether state
//! - [`settings`] - Application settings loading and validation
//! - [`sim`] - In-process simulated radio
//! - [`error`] - Unified error types for the crate
//! - [`types`] - Shared types and OpenAPI schemas

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod adapter;
pub mod config;
pub mod controller;
pub mod error;
pub mod notification;
pub mod platform;
pub mod publisher;
pub mod settings;
#[cfg(any(test, feature = "simulated-radio"))]
pub mod sim;
pub mod types;

// Re-export primary types for convenience
pub use adapter::{
    ActivationId, FailureReason, HotspotAdapter, HotspotCallback, HotspotRadio, Reservation,
    SessionHandle,
};
pub use config::{
    Band, ConfigError, ConfigResult, HotspotConfig, HotspotRequest, MacRandomization,
    RadioSelection, RequestDefaults, SecurityMode, MAX_PSK_LENGTH, MAX_SSID_BYTES,
    MIN_PSK_LENGTH,
};
pub use controller::{ControllerOptions, HotspotController, DEFAULT_ACTIVATION_TIMEOUT};
pub use error::{HotspotError, Result};
pub use notification::{
    spawn_notification_bridge, LogNotificationSurface, Notification, NotificationSettings,
    NotificationSurface,
};
pub use platform::{select_builder, ConfigBuilder, SoftApConfiguration};
pub use publisher::{StatePublisher, TetherStateStream, TetherStateWatch};
pub use settings::Settings;
#[cfg(any(test, feature = "simulated-radio"))]
pub use sim::{SimulatedOutcome, SimulatedRadio};
pub use types::{ActiveSession, HotspotStatus, Phase, StopOutcome};
