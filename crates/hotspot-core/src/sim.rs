//! Simulated radio for tests and hosts without a platform binding.
//!
//! Outcomes are scripted per activation: start after a delay, fail with a
//! reason, or never answer. Like the real radio, only one reservation can be
//! live at a time; an activation requested or delivered while another
//! reservation is live fails with [`FailureReason::Busy`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use hotspot_core::sim::{SimulatedOutcome, SimulatedRadio};
//!
//! let radio = Arc::new(SimulatedRadio::new());
//! radio.push_outcome(SimulatedOutcome::Start { after: Duration::from_millis(50) });
//! radio.push_outcome(SimulatedOutcome::Hang);
//! assert_eq!(radio.activation_count(), 0);
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::adapter::{ActivationId, FailureReason, HotspotCallback, HotspotRadio, Reservation};
use crate::platform::SoftApConfiguration;

/// What the simulated radio does with one activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedOutcome {
    /// Report `Started` after `after`.
    Start {
        /// Delay before the callback fires.
        after: Duration,
    },
    /// Report `Failed(reason)` after `after`.
    Fail {
        /// Reason handed to the callback.
        reason: FailureReason,
        /// Delay before the callback fires.
        after: Duration,
    },
    /// Never answer, until [`SimulatedRadio::resolve_pending`].
    Hang,
}

impl Default for SimulatedOutcome {
    fn default() -> Self {
        Self::Start {
            after: Duration::ZERO,
        }
    }
}

#[derive(Default)]
struct SimState {
    script: VecDeque<SimulatedOutcome>,
    default_outcome: SimulatedOutcome,
    stop_on_close: bool,
    activations: Vec<SoftApConfiguration>,
    live: HashMap<ActivationId, HotspotCallback>,
    hanging: Vec<HotspotCallback>,
    starts: usize,
    closes: usize,
    max_live: usize,
}

type Shared = Arc<Mutex<SimState>>;

fn lock(state: &Shared) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process [`HotspotRadio`].
///
/// Callbacks are delivered from spawned Tokio tasks, so the radio must be
/// driven from inside a runtime.
#[derive(Clone, Default)]
pub struct SimulatedRadio {
    state: Shared,
}

impl SimulatedRadio {
    /// Radio that starts every activation immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome used once the script is exhausted.
    #[must_use]
    pub fn with_default_outcome(self, outcome: SimulatedOutcome) -> Self {
        lock(&self.state).default_outcome = outcome;
        self
    }

    /// Also report `Stopped` when a reservation is closed.
    #[must_use]
    pub fn with_stop_on_close(self) -> Self {
        lock(&self.state).stop_on_close = true;
        self
    }

    /// Queue the outcome of the next unscripted activation.
    pub fn push_outcome(&self, outcome: SimulatedOutcome) {
        lock(&self.state).script.push_back(outcome);
    }

    /// Stop every live session from the platform side, as when the user
    /// turns Wi-Fi off. Returns how many sessions were stopped.
    pub fn interrupt(&self) -> usize {
        let callbacks: Vec<_> = lock(&self.state).live.drain().map(|(_, cb)| cb).collect();
        for callback in &callbacks {
            debug!(activation = %callback.activation(), "Simulated radio interrupted");
            callback.on_stopped();
        }
        callbacks.len()
    }

    /// Deliver `Started` for every activation left hanging. Returns how many
    /// were resolved.
    pub fn resolve_pending(&self) -> usize {
        let hanging = std::mem::take(&mut lock(&self.state).hanging);
        let count = hanging.len();
        for callback in hanging {
            deliver_start(&self.state, &callback);
        }
        count
    }

    /// Number of activations requested so far.
    #[must_use]
    pub fn activation_count(&self) -> usize {
        lock(&self.state).activations.len()
    }

    /// Configurations received, in order.
    #[must_use]
    pub fn activations(&self) -> Vec<SoftApConfiguration> {
        lock(&self.state).activations.clone()
    }

    /// Number of sessions the radio reported as started.
    #[must_use]
    pub fn started_count(&self) -> usize {
        lock(&self.state).starts
    }

    /// Number of reservations closed.
    #[must_use]
    pub fn close_count(&self) -> usize {
        lock(&self.state).closes
    }

    /// Number of reservations currently live.
    #[must_use]
    pub fn live_count(&self) -> usize {
        lock(&self.state).live.len()
    }

    /// Highest number of reservations ever live at once.
    #[must_use]
    pub fn max_live(&self) -> usize {
        lock(&self.state).max_live
    }
}

impl HotspotRadio for SimulatedRadio {
    fn start_local_only_hotspot(&self, config: SoftApConfiguration, callback: HotspotCallback) {
        let (outcome, busy) = {
            let mut sim = lock(&self.state);
            sim.activations.push(config);
            let outcome = sim.script.pop_front().unwrap_or(sim.default_outcome);
            (outcome, !sim.live.is_empty())
        };
        debug!(activation = %callback.activation(), ?outcome, busy, "Simulated activation");

        if busy {
            tokio::spawn(async move { callback.on_failed_with(FailureReason::Busy) });
            return;
        }

        match outcome {
            SimulatedOutcome::Start { after } => {
                let state = Arc::clone(&self.state);
                tokio::spawn(async move {
                    sleep_for(after).await;
                    deliver_start(&state, &callback);
                });
            }
            SimulatedOutcome::Fail { reason, after } => {
                tokio::spawn(async move {
                    sleep_for(after).await;
                    callback.on_failed_with(reason);
                });
            }
            SimulatedOutcome::Hang => lock(&self.state).hanging.push(callback),
        }
    }
}

impl fmt::Debug for SimulatedRadio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sim = lock(&self.state);
        f.debug_struct("SimulatedRadio")
            .field("activations", &sim.activations.len())
            .field("live", &sim.live.len())
            .field("closes", &sim.closes)
            .finish_non_exhaustive()
    }
}

async fn sleep_for(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn deliver_start(state: &Shared, callback: &HotspotCallback) {
    let activation = callback.activation();
    let (busy, stop_on_close) = {
        let mut sim = lock(state);
        let busy = !sim.live.is_empty();
        if !busy {
            sim.live.insert(activation, callback.clone());
            sim.starts += 1;
            sim.max_live = sim.max_live.max(sim.live.len());
        }
        (busy, sim.stop_on_close)
    };

    // Callbacks run unlocked: a dead controller closes the reservation inline.
    if busy {
        callback.on_failed_with(FailureReason::Busy);
    } else {
        callback.on_started(Box::new(SimulatedReservation {
            activation,
            state: Arc::clone(state),
            stop_on_close,
            closed: false,
        }));
    }
}

struct SimulatedReservation {
    activation: ActivationId,
    state: Shared,
    stop_on_close: bool,
    closed: bool,
}

impl Reservation for SimulatedReservation {
    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let callback = {
            let mut sim = lock(&self.state);
            sim.closes += 1;
            sim.live.remove(&self.activation)
        };
        debug!(activation = %self.activation, "Simulated reservation closed");
        if self.stop_on_close {
            if let Some(callback) = callback {
                callback.on_stopped();
            }
        }
    }
}
