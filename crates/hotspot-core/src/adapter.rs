//! Adapter over the platform's local-only hotspot primitive.
//!
//! The platform primitive ([`HotspotRadio`]) accepts a configuration and a
//! callback and reports back later, on whatever thread it likes, with one of
//! three outcomes. The adapter tags every activation with an
//! [`ActivationId`] and normalizes the outcomes into [`AdapterEvent`]s on a
//! single channel, which the lifecycle controller drains.
//!
//! The adapter never retries. Failures are reported upward as-is.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::platform::SoftApConfiguration;

/// Identifies one call to [`HotspotAdapter::activate`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ActivationId(u64);

impl ActivationId {
    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActivationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why an activation did not produce a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// No usable channel was available.
    NoChannel,
    /// Unspecified platform error.
    Generic,
    /// The radio is in a mode that excludes a local-only hotspot.
    IncompatibleMode,
    /// Device policy forbids tethering.
    TetheringDisallowed,
    /// The radio resource is already held by another session.
    Busy,
    /// The platform reported a stop before the session started.
    StoppedBeforeStart,
    /// No outcome arrived within the activation timeout.
    TimedOut,
    /// A platform failure code this crate does not know.
    Other(i32),
}

impl FailureReason {
    /// Decode a platform failure code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::NoChannel,
            2 => Self::Generic,
            3 => Self::IncompatibleMode,
            4 => Self::TetheringDisallowed,
            other => Self::Other(other),
        }
    }

    /// Platform failure code, if this reason has one.
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        match self {
            Self::NoChannel => Some(1),
            Self::Generic => Some(2),
            Self::IncompatibleMode => Some(3),
            Self::TetheringDisallowed => Some(4),
            Self::Other(code) => Some(code),
            Self::Busy | Self::StoppedBeforeStart | Self::TimedOut => None,
        }
    }

    /// Whether trying again later may succeed.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Self::NoChannel | Self::Busy | Self::TimedOut | Self::StoppedBeforeStart
        )
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChannel => f.write_str("no channel available"),
            Self::Generic => f.write_str("generic platform error"),
            Self::IncompatibleMode => f.write_str("radio is in an incompatible mode"),
            Self::TetheringDisallowed => f.write_str("tethering is disallowed by policy"),
            Self::Busy => f.write_str("radio is busy"),
            Self::StoppedBeforeStart => f.write_str("stopped before the session started"),
            Self::TimedOut => f.write_str("timed out waiting for the radio"),
            Self::Other(code) => write!(f, "platform error code {code}"),
        }
    }
}

/// The platform's reservation object for a live hotspot.
///
/// Closing the reservation deactivates the access point. Implementations must
/// tolerate `close` being called more than once.
pub trait Reservation: Send {
    /// Release the reservation.
    fn close(&mut self);
}

/// Capability representing one live activation.
///
/// Only the lifecycle controller holds these. [`SessionHandle::close`]
/// consumes the handle, so a closed handle cannot be reused. A handle dropped
/// while still live closes its reservation so the radio is never orphaned.
pub struct SessionHandle {
    activation: ActivationId,
    reservation: Option<Box<dyn Reservation>>,
}

impl SessionHandle {
    fn new(activation: ActivationId, reservation: Box<dyn Reservation>) -> Self {
        Self {
            activation,
            reservation: Some(reservation),
        }
    }

    /// The activation that produced this handle.
    #[must_use]
    pub const fn activation(&self) -> ActivationId {
        self.activation
    }

    /// Close the reservation, deactivating the access point.
    pub(crate) fn close(mut self) {
        if let Some(mut reservation) = self.reservation.take() {
            reservation.close();
        }
    }

    /// Forget a handle whose session the platform already stopped.
    pub(crate) fn release(mut self) {
        self.reservation.take();
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(mut reservation) = self.reservation.take() {
            warn!(activation = %self.activation, "Session handle dropped while live, closing");
            reservation.close();
        }
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("activation", &self.activation)
            .field("live", &self.reservation.is_some())
            .finish()
    }
}

/// Outcome reported by the radio for one activation.
#[derive(Debug)]
pub enum RadioEvent {
    /// The access point is up; the handle must eventually be closed.
    Started(SessionHandle),
    /// The access point went down.
    Stopped,
    /// The activation failed.
    Failed(FailureReason),
}

/// A [`RadioEvent`] tagged with its activation.
#[derive(Debug)]
pub struct AdapterEvent {
    /// Activation the event belongs to.
    pub activation: ActivationId,
    /// What happened.
    pub kind: RadioEvent,
}

/// Callback handed to the radio for one activation.
///
/// Cheap to clone; radios may keep a copy to report a later external stop.
/// Calls after the controller has gone away are dropped, and a reservation
/// delivered to a dead controller is closed immediately.
#[derive(Debug, Clone)]
pub struct HotspotCallback {
    activation: ActivationId,
    events: mpsc::UnboundedSender<AdapterEvent>,
}

impl HotspotCallback {
    /// Create a callback feeding `events`.
    ///
    /// The adapter creates these itself; this is public so that event sources
    /// can be scripted in tests.
    #[must_use]
    pub fn new(activation: ActivationId, events: mpsc::UnboundedSender<AdapterEvent>) -> Self {
        Self { activation, events }
    }

    /// Activation this callback reports for.
    #[must_use]
    pub const fn activation(&self) -> ActivationId {
        self.activation
    }

    /// The access point started and `reservation` keeps it alive.
    pub fn on_started(&self, reservation: Box<dyn Reservation>) {
        let handle = SessionHandle::new(self.activation, reservation);
        self.send(RadioEvent::Started(handle));
    }

    /// The access point stopped.
    pub fn on_stopped(&self) {
        self.send(RadioEvent::Stopped);
    }

    /// The activation failed with a raw platform code.
    pub fn on_failed(&self, code: i32) {
        self.on_failed_with(FailureReason::from_code(code));
    }

    /// The activation failed.
    pub fn on_failed_with(&self, reason: FailureReason) {
        self.send(RadioEvent::Failed(reason));
    }

    fn send(&self, kind: RadioEvent) {
        let event = AdapterEvent {
            activation: self.activation,
            kind,
        };
        if let Err(mpsc::error::SendError(event)) = self.events.send(event) {
            debug!(
                activation = %event.activation,
                "Hotspot controller gone, dropping radio event"
            );
        }
    }
}

/// The platform's asynchronous "start local-only hotspot" primitive.
pub trait HotspotRadio: Send + Sync + 'static {
    /// Begin activating an access point. Must return without blocking; the
    /// outcome is reported through `callback`.
    fn start_local_only_hotspot(&self, config: SoftApConfiguration, callback: HotspotCallback);
}

/// Uniform start/stop surface over a [`HotspotRadio`].
pub struct HotspotAdapter {
    radio: Arc<dyn HotspotRadio>,
    events: mpsc::UnboundedSender<AdapterEvent>,
    next_activation: u64,
}

impl HotspotAdapter {
    /// Wrap `radio`. Returns the adapter and the receiving end of its event
    /// channel.
    pub fn new(radio: Arc<dyn HotspotRadio>) -> (Self, mpsc::UnboundedReceiver<AdapterEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let adapter = Self {
            radio,
            events,
            next_activation: 1,
        };
        (adapter, rx)
    }

    /// Ask the radio to start an access point. Returns immediately.
    pub fn activate(&mut self, config: SoftApConfiguration) -> ActivationId {
        let activation = ActivationId(self.next_activation);
        self.next_activation += 1;

        debug!(%activation, ssid = config.ssid(), "Requesting local-only hotspot");
        let callback = HotspotCallback::new(activation, self.events.clone());
        self.radio.start_local_only_hotspot(config, callback);
        activation
    }

    /// Close a live session.
    #[allow(clippy::unused_self)]
    pub fn deactivate(&self, handle: SessionHandle) {
        debug!(activation = %handle.activation(), "Closing hotspot reservation");
        handle.close();
    }
}

impl fmt::Debug for HotspotAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotspotAdapter")
            .field("next_activation", &self.next_activation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::config::HotspotRequest;
    use crate::platform::{ConfigBuilder, FullConfigBuilder};

    struct CountingReservation(Arc<AtomicUsize>);

    impl Reservation for CountingReservation {
        fn close(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct CapturingRadio {
        callbacks: Mutex<Vec<HotspotCallback>>,
    }

    impl HotspotRadio for CapturingRadio {
        fn start_local_only_hotspot(&self, _config: SoftApConfiguration, callback: HotspotCallback) {
            self.callbacks.lock().unwrap().push(callback);
        }
    }

    fn soft_ap() -> SoftApConfiguration {
        let config = HotspotRequest::new("Home", "secret123").build().unwrap();
        FullConfigBuilder::new(33).build(&config).unwrap()
    }

    #[test]
    fn test_failure_codes() {
        assert_eq!(FailureReason::from_code(1), FailureReason::NoChannel);
        assert_eq!(FailureReason::from_code(4), FailureReason::TetheringDisallowed);
        assert_eq!(FailureReason::from_code(42), FailureReason::Other(42));
        assert_eq!(FailureReason::Busy.code(), None);
        assert!(FailureReason::Busy.is_transient());
        assert!(!FailureReason::TetheringDisallowed.is_transient());
    }

    #[test]
    fn test_activation_ids_are_distinct_and_events_tagged() {
        let radio = Arc::new(CapturingRadio::default());
        let (mut adapter, mut events) = HotspotAdapter::new(radio.clone());

        let first = adapter.activate(soft_ap());
        let second = adapter.activate(soft_ap());
        assert_ne!(first, second);

        let callbacks = radio.callbacks.lock().unwrap().clone();
        callbacks[1].on_failed(2);
        callbacks[0].on_stopped();

        let event = events.try_recv().unwrap();
        assert_eq!(event.activation, second);
        assert!(matches!(event.kind, RadioEvent::Failed(FailureReason::Generic)));

        let event = events.try_recv().unwrap();
        assert_eq!(event.activation, first);
        assert!(matches!(event.kind, RadioEvent::Stopped));
    }

    #[test]
    fn test_deactivate_closes_reservation_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let radio = Arc::new(CapturingRadio::default());
        let (mut adapter, mut events) = HotspotAdapter::new(radio.clone());
        adapter.activate(soft_ap());

        let callback = radio.callbacks.lock().unwrap()[0].clone();
        callback.on_started(Box::new(CountingReservation(closes.clone())));

        let RadioEvent::Started(handle) = events.try_recv().unwrap().kind else {
            panic!("expected Started");
        };
        adapter.deactivate(handle);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_started_after_controller_gone_closes_reservation() {
        let closes = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let callback = HotspotCallback::new(ActivationId(7), tx);
        callback.on_started(Box::new(CountingReservation(closes.clone())));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_does_not_close() {
        let closes = Arc::new(AtomicUsize::new(0));
        let handle = SessionHandle::new(
            ActivationId(1),
            Box::new(CountingReservation(closes.clone())),
        );
        handle.release();
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }
}
