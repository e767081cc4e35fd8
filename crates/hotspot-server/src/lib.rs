//! # hotspot-server
//!
//! HTTP server library for the local-only hotspot controller.
//!
//! This library provides the API handlers and state management for hotspot.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod api;
pub mod logging;
pub mod state;
