//! Hotspot lifecycle controller.
//!
//! The controller is an actor: [`HotspotController`] is a cheap, cloneable
//! handle that sends commands to a single spawned control loop. The loop is
//! the only owner of the [`SessionHandle`] and the only writer of the tether
//! state, so start and stop requests from any number of threads are applied
//! one at a time and at most one session can ever be live.
//!
//! ```text
//!            start                 Started(h)
//!   Idle ───────────▶ Starting ───────────────▶ Active
//!    ▲                 │  │                      │
//!    │  Failed/timeout │  │ stop (abandon)       │ stop / Stopped
//!    └─────────────────┘  └──────────────────────┴──────▶ Idle
//! ```
//!
//! Starting while `Active` closes the held session first. Starting while
//! `Starting` queues the new request behind the activation in flight: the
//! radio only ever sees one activation at a time, and the queued request is
//! handed to it once the earlier one resolves (its session, if any, is
//! closed on arrival). Any `Started` from an activation the loop no longer
//! waits for is closed on the spot, so no handle is ever orphaned.

use std::mem;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::adapter::{
    ActivationId, AdapterEvent, FailureReason, HotspotAdapter, HotspotRadio, RadioEvent,
    SessionHandle,
};
use crate::config::{HotspotConfig, HotspotRequest, RequestDefaults};
use crate::error::{HotspotError, Result};
use crate::platform::{ConfigBuilder, SoftApConfiguration};
use crate::publisher::{StatePublisher, TetherStateStream, TetherStateWatch};
use crate::types::{ActiveSession, HotspotStatus, Phase, StopOutcome};

/// How long an activation may stay unanswered before it counts as failed.
pub const DEFAULT_ACTIVATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Tunables for the control loop.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Bound on the `Starting` phase.
    pub activation_timeout: Duration,
    /// Values for request fields the caller leaves out.
    pub defaults: RequestDefaults,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            activation_timeout: DEFAULT_ACTIVATION_TIMEOUT,
            defaults: RequestDefaults::default(),
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T>>;

#[derive(Debug)]
enum Command {
    Start {
        request: HotspotRequest,
        reply: Option<Reply<ActiveSession>>,
    },
    Stop {
        reply: Option<Reply<StopOutcome>>,
    },
    Status {
        reply: oneshot::Sender<HotspotStatus>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to the hotspot lifecycle controller.
///
/// Every method is safe to call from any thread. Dropping the last handle
/// shuts the controller down and closes any live session.
#[derive(Debug, Clone)]
pub struct HotspotController {
    commands: mpsc::UnboundedSender<Command>,
    state: TetherStateWatch,
}

impl HotspotController {
    /// Spawn the control loop on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(
        radio: Arc<dyn HotspotRadio>,
        builder: Arc<dyn ConfigBuilder>,
        options: ControllerOptions,
    ) -> Self {
        let (adapter, events) = HotspotAdapter::new(radio);
        let publisher = StatePublisher::new(false);
        let state = publisher.watch();
        let (commands, command_rx) = mpsc::unbounded_channel();

        let control = ControlLoop {
            adapter,
            builder,
            publisher,
            options,
            state: State::Idle,
        };
        tokio::spawn(control.run(command_rx, events));

        Self { commands, state }
    }

    /// Request a hotspot and return immediately.
    ///
    /// The outcome shows up on the state stream and in the logs.
    pub fn start_tethering(&self, request: HotspotRequest) {
        self.send(Command::Start {
            request,
            reply: None,
        });
    }

    /// Request the hotspot be stopped and return immediately.
    pub fn stop_tethering(&self) {
        self.send(Command::Stop { reply: None });
    }

    /// Request a hotspot and wait until the radio answers.
    ///
    /// # Errors
    ///
    /// Returns the configuration error, activation failure or timeout that
    /// prevented the session, [`HotspotError::Superseded`] /
    /// [`HotspotError::Cancelled`] if a later request overtook this one, or
    /// [`HotspotError::ControllerUnavailable`] after shutdown.
    pub async fn start(&self, request: HotspotRequest) -> Result<ActiveSession> {
        let (reply, rx) = oneshot::channel();
        self.request(
            Command::Start {
                request,
                reply: Some(reply),
            },
            rx,
        )
        .await?
    }

    /// Stop the hotspot and report what was stopped.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::ControllerUnavailable`] after shutdown.
    pub async fn stop(&self) -> Result<StopOutcome> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Stop { reply: Some(reply) }, rx).await?
    }

    /// Snapshot of the controller's phase and session.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::ControllerUnavailable`] after shutdown.
    pub async fn status(&self) -> Result<HotspotStatus> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::Status { reply }, rx).await
    }

    /// Close any live session and stop the control loop.
    pub async fn shutdown(&self) {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).is_ok() {
            let _ = rx.await;
        }
    }

    /// Whether a session is currently held.
    #[must_use]
    pub fn tether_state(&self) -> bool {
        self.state.current()
    }

    /// Stream of tether state, starting with the current value.
    #[must_use]
    pub fn subscribe(&self) -> TetherStateStream {
        self.state.subscribe()
    }

    /// Read-only view of the tether state for collaborators.
    #[must_use]
    pub fn state_watch(&self) -> TetherStateWatch {
        self.state.clone()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("Hotspot controller is not running, request dropped");
        }
    }

    async fn request<T>(&self, command: Command, rx: oneshot::Receiver<T>) -> Result<T> {
        self.commands
            .send(command)
            .map_err(|_| HotspotError::ControllerUnavailable)?;
        rx.await.map_err(|_| HotspotError::ControllerUnavailable)
    }
}

// ============================================================================
// Control loop
// ============================================================================

struct Pending {
    activation: ActivationId,
    config: HotspotConfig,
    deadline: Instant,
    /// `None` once a later request has superseded this one.
    reply: Option<Reply<ActiveSession>>,
    /// Request to activate once this activation resolves.
    next: Option<Queued>,
}

/// A validated start request waiting for the radio.
struct Queued {
    config: HotspotConfig,
    soft_ap: SoftApConfiguration,
    reply: Option<Reply<ActiveSession>>,
}

struct Live {
    handle: SessionHandle,
    session: ActiveSession,
}

enum State {
    Idle,
    Starting(Pending),
    Active(Live),
}

struct ControlLoop {
    adapter: HotspotAdapter,
    builder: Arc<dyn ConfigBuilder>,
    publisher: StatePublisher,
    options: ControllerOptions,
    state: State,
}

impl ControlLoop {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<AdapterEvent>,
    ) {
        debug!(
            api_level = self.builder.api_level(),
            timeout_secs = self.options.activation_timeout.as_secs(),
            "Hotspot controller started"
        );

        loop {
            let deadline = self.pending_deadline();
            tokio::select! {
                biased;
                Some(event) = events.recv() => self.handle_event(event),
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if self.handle_command(command).is_break() {
                        break;
                    }
                }
                () = wait_until(deadline) => self.expire_pending(),
            }
        }

        self.shutdown();
        debug!("Hotspot controller stopped");
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Start { request, reply } => self.start(request, reply),
            Command::Stop { reply } => {
                let outcome = self.stop();
                respond(reply, Ok(outcome));
            }
            Command::Status { reply } => {
                let _ = reply.send(self.status());
            }
            Command::Shutdown { reply } => {
                self.shutdown();
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn start(&mut self, request: HotspotRequest, reply: Option<Reply<ActiveSession>>) {
        let request = request.with_defaults(&self.options.defaults);
        let prepared = request.build().map_err(HotspotError::from).and_then(|config| {
            let soft_ap = self.builder.build(&config)?;
            Ok((config, soft_ap))
        });

        let (config, soft_ap) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(error = %err, "Rejected hotspot start request");
                respond(reply, Err(err));
                return;
            }
        };

        let queued = Queued {
            config,
            soft_ap,
            reply,
        };

        if let State::Starting(pending) = &mut self.state {
            debug!(
                activation = %pending.activation,
                ssid = queued.config.name(),
                "Queueing hotspot start behind pending activation"
            );
            respond(pending.reply.take(), Err(HotspotError::Superseded));
            if let Some(previous) = pending.next.replace(queued) {
                respond(previous.reply, Err(HotspotError::Superseded));
            }
            return;
        }

        self.drive_to_idle(|| HotspotError::Superseded);
        self.activate(queued);
    }

    fn activate(&mut self, queued: Queued) {
        let Queued {
            config,
            soft_ap,
            reply,
        } = queued;

        let activation = self.adapter.activate(soft_ap);
        info!(
            %activation,
            ssid = config.name(),
            security = %config.security_mode(),
            band = %config.radio().band(),
            "Starting local-only hotspot"
        );
        self.state = State::Starting(Pending {
            activation,
            config,
            deadline: Instant::now() + self.options.activation_timeout,
            reply,
            next: None,
        });
    }

    /// Hand a queued request to the radio once the activation ahead of it
    /// has resolved.
    fn activate_next(&mut self, next: Option<Queued>) {
        if let Some(next) = next {
            self.activate(next);
        }
    }

    fn stop(&mut self) -> StopOutcome {
        let outcome = self.drive_to_idle(|| HotspotError::Cancelled);
        if outcome == StopOutcome::AlreadyStopped {
            debug!("Local-only hotspot already stopped");
        }
        outcome
    }

    /// Leave whatever state we are in for `Idle`, closing a held session or
    /// abandoning a pending activation (whose callers get `pending_error`).
    fn drive_to_idle(&mut self, pending_error: fn() -> HotspotError) -> StopOutcome {
        let outcome = match mem::replace(&mut self.state, State::Idle) {
            State::Idle => StopOutcome::AlreadyStopped,
            State::Starting(pending) => {
                debug!(activation = %pending.activation, "Abandoning pending activation");
                if let Some(next) = pending.next {
                    respond(next.reply, Err(pending_error()));
                }
                respond(pending.reply, Err(pending_error()));
                StopOutcome::CancelledPending
            }
            State::Active(live) => {
                info!(
                    activation = %live.session.activation,
                    ssid = %live.session.name,
                    "Stopping local-only hotspot"
                );
                self.adapter.deactivate(live.handle);
                StopOutcome::Stopped
            }
        };
        self.publisher.publish(false);
        outcome
    }

    fn handle_event(&mut self, event: AdapterEvent) {
        let AdapterEvent { activation, kind } = event;
        match kind {
            RadioEvent::Started(handle) => self.on_started(activation, handle),
            RadioEvent::Stopped => self.on_stopped(activation),
            RadioEvent::Failed(reason) => self.on_failed(activation, reason),
        }
    }

    fn on_started(&mut self, activation: ActivationId, handle: SessionHandle) {
        match mem::replace(&mut self.state, State::Idle) {
            State::Starting(pending) if pending.activation == activation => {
                if pending.next.is_some() {
                    info!(%activation, "Closing session of superseded activation");
                    self.adapter.deactivate(handle);
                    self.activate_next(pending.next);
                    return;
                }
                let session = ActiveSession::new(activation, &pending.config);
                info!(%activation, ssid = %session.name, "Local-only hotspot started");
                self.state = State::Active(Live {
                    handle,
                    session: session.clone(),
                });
                self.publisher.publish(true);
                respond(pending.reply, Ok(session));
            }
            other => {
                self.state = other;
                info!(%activation, "Closing session of inactive activation");
                self.adapter.deactivate(handle);
            }
        }
    }

    fn on_stopped(&mut self, activation: ActivationId) {
        match mem::replace(&mut self.state, State::Idle) {
            State::Active(live) if live.session.activation == activation => {
                info!(
                    %activation,
                    ssid = %live.session.name,
                    "Local-only hotspot stopped by the platform"
                );
                live.handle.release();
                self.publisher.publish(false);
            }
            State::Starting(pending) if pending.activation == activation => {
                warn!(%activation, "Platform stopped the hotspot before it started");
                respond(
                    pending.reply,
                    Err(HotspotError::ActivationFailed(
                        FailureReason::StoppedBeforeStart,
                    )),
                );
                self.activate_next(pending.next);
            }
            other => {
                self.state = other;
                debug!(%activation, "Ignoring stop of inactive activation");
            }
        }
    }

    fn on_failed(&mut self, activation: ActivationId, reason: FailureReason) {
        match mem::replace(&mut self.state, State::Idle) {
            State::Starting(pending) if pending.activation == activation => {
                warn!(%activation, %reason, "Local-only hotspot failed to start");
                respond(pending.reply, Err(HotspotError::ActivationFailed(reason)));
                self.activate_next(pending.next);
            }
            other => {
                self.state = other;
                debug!(%activation, %reason, "Ignoring failure of inactive activation");
            }
        }
    }

    fn expire_pending(&mut self) {
        match mem::replace(&mut self.state, State::Idle) {
            State::Starting(pending) => {
                let timeout_secs = self.options.activation_timeout.as_secs();
                warn!(
                    activation = %pending.activation,
                    timeout_secs,
                    "Local-only hotspot activation timed out"
                );
                respond(
                    pending.reply,
                    Err(HotspotError::ActivationTimedOut { timeout_secs }),
                );
                self.activate_next(pending.next);
            }
            other => self.state = other,
        }
    }

    fn shutdown(&mut self) {
        if !matches!(self.state, State::Idle) {
            info!("Shutting down hotspot controller");
        }
        self.drive_to_idle(|| HotspotError::ControllerUnavailable);
    }

    fn status(&self) -> HotspotStatus {
        match &self.state {
            State::Idle => HotspotStatus {
                active: false,
                phase: Phase::Idle,
                pending_activation: None,
                session: None,
            },
            State::Starting(pending) => HotspotStatus {
                active: false,
                phase: Phase::Starting,
                pending_activation: Some(pending.activation),
                session: None,
            },
            State::Active(live) => HotspotStatus {
                active: true,
                phase: Phase::Active,
                pending_activation: None,
                session: Some(live.session.clone()),
            },
        }
    }

    fn pending_deadline(&self) -> Option<Instant> {
        match &self.state {
            State::Starting(pending) => Some(pending.deadline),
            _ => None,
        }
    }
}

fn respond<T>(reply: Option<Reply<T>>, result: Result<T>) {
    if let Some(reply) = reply {
        let _ = reply.send(result);
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::adapter::{HotspotCallback, Reservation};
    use crate::config::{Band, ConfigError, SecurityMode};
    use crate::platform::{select_builder, SoftApConfiguration};

    /// Radio that hands every activation to the test, which then plays the
    /// platform by firing callbacks by hand.
    struct ManualRadio {
        requests: mpsc::UnboundedSender<(SoftApConfiguration, HotspotCallback)>,
    }

    impl HotspotRadio for ManualRadio {
        fn start_local_only_hotspot(&self, config: SoftApConfiguration, callback: HotspotCallback) {
            let _ = self.requests.send((config, callback));
        }
    }

    struct CountingReservation(Arc<AtomicUsize>);

    impl Reservation for CountingReservation {
        fn close(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    type Requests = mpsc::UnboundedReceiver<(SoftApConfiguration, HotspotCallback)>;

    fn controller_with(options: ControllerOptions) -> (HotspotController, Requests) {
        let (tx, rx) = mpsc::unbounded_channel();
        let radio = Arc::new(ManualRadio { requests: tx });
        let controller = HotspotController::spawn(radio, select_builder(33).unwrap(), options);
        (controller, rx)
    }

    fn controller() -> (HotspotController, Requests) {
        controller_with(ControllerOptions::default())
    }

    #[tokio::test]
    async fn test_start_publishes_true() {
        let (controller, mut requests) = controller();
        let mut states = controller.subscribe();
        let closes = Arc::new(AtomicUsize::new(0));

        let start = tokio::spawn({
            let controller = controller.clone();
            async move { controller.start(HotspotRequest::new("Home", "secret123")).await }
        });

        let (config, callback) = requests.recv().await.unwrap();
        assert_eq!(config.ssid(), "Home");
        callback.on_started(Box::new(CountingReservation(closes.clone())));

        let session = start.await.unwrap().unwrap();
        assert_eq!(session.name, "Home");
        assert!(controller.tether_state());
        assert_eq!(states.recv().await, Some(false));
        assert_eq!(states.recv().await, Some(true));

        let status = controller.status().await.unwrap();
        assert_eq!(status.phase, Phase::Active);
        assert_eq!(status.session.unwrap().session_id, session.session_id);
    }

    #[tokio::test]
    async fn test_invalid_config_never_reaches_radio() {
        let (controller, mut requests) = controller();

        for (name, passphrase) in [("", ""), ("name", ""), ("", "pass")] {
            let err = controller
                .start(HotspotRequest::new(name, passphrase))
                .await
                .unwrap_err();
            assert!(err.is_config_error(), "{name:?}/{passphrase:?}: {err}");
        }

        assert!(requests.try_recv().is_err());
        assert_eq!(controller.status().await.unwrap().phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_invalid_config_keeps_live_session() {
        let (controller, mut requests) = controller();
        let closes = Arc::new(AtomicUsize::new(0));

        controller.start_tethering(HotspotRequest::new("Home", "secret123"));
        let (_, callback) = requests.recv().await.unwrap();
        callback.on_started(Box::new(CountingReservation(closes.clone())));
        assert_eq!(controller.status().await.unwrap().phase, Phase::Active);

        let err = controller
            .start(HotspotRequest::new("Home", "short"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HotspotError::Config(ConfigError::InvalidPassphrase { .. })
        ));
        assert!(controller.tether_state());
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_benign() {
        let (controller, _requests) = controller();
        let mut states = controller.subscribe();

        assert_eq!(controller.stop().await.unwrap(), StopOutcome::AlreadyStopped);
        assert_eq!(controller.stop().await.unwrap(), StopOutcome::AlreadyStopped);

        assert_eq!(states.try_recv(), Some(false));
        assert_eq!(states.try_recv(), None);
    }

    #[tokio::test]
    async fn test_stop_while_starting_closes_late_session() {
        let (controller, mut requests) = controller();
        let closes = Arc::new(AtomicUsize::new(0));

        let start = tokio::spawn({
            let controller = controller.clone();
            async move { controller.start(HotspotRequest::new("Home", "secret123")).await }
        });
        let (_, callback) = requests.recv().await.unwrap();

        assert_eq!(controller.stop().await.unwrap(), StopOutcome::CancelledPending);
        assert!(matches!(
            start.await.unwrap().unwrap_err(),
            HotspotError::Cancelled
        ));

        callback.on_started(Box::new(CountingReservation(closes.clone())));
        // Round-trip through the loop so the event has been handled.
        let status = controller.status().await.unwrap();
        assert_eq!(status.phase, Phase::Idle);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!controller.tether_state());
    }

    #[tokio::test]
    async fn test_start_while_starting_waits_for_radio() {
        let (controller, mut requests) = controller();
        let closes = Arc::new(AtomicUsize::new(0));

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.start(HotspotRequest::new("Home", "secret123")).await }
        });
        let (_, first_callback) = requests.recv().await.unwrap();

        let second = tokio::spawn({
            let controller = controller.clone();
            async move { controller.start(HotspotRequest::new("Office", "other456")).await }
        });
        assert!(matches!(
            first.await.unwrap().unwrap_err(),
            HotspotError::Superseded
        ));

        // Nothing reaches the radio while the first activation is in flight.
        let status = controller.status().await.unwrap();
        assert_eq!(status.phase, Phase::Starting);
        assert_eq!(status.pending_activation, Some(first_callback.activation()));
        assert!(requests.try_recv().is_err());

        first_callback.on_started(Box::new(CountingReservation(closes.clone())));
        let (config, second_callback) = requests.recv().await.unwrap();
        assert_eq!(config.ssid(), "Office");
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!controller.tether_state());

        second_callback.on_started(Box::new(CountingReservation(closes.clone())));
        assert_eq!(second.await.unwrap().unwrap().name, "Office");
        assert!(controller.tether_state());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_queued_start_follows_failed_activation() {
        let (controller, mut requests) = controller();

        controller.start_tethering(HotspotRequest::new("Home", "secret123"));
        let (_, first_callback) = requests.recv().await.unwrap();
        controller.start_tethering(HotspotRequest::new("Cafe", "secret123"));
        let last = tokio::spawn({
            let controller = controller.clone();
            async move { controller.start(HotspotRequest::new("Office", "other456")).await }
        });
        // Only the newest queued request survives.
        tokio::task::yield_now().await;
        controller.status().await.unwrap();

        first_callback.on_failed_with(FailureReason::Busy);
        let (config, callback) = requests.recv().await.unwrap();
        assert_eq!(config.ssid(), "Office");
        callback.on_started(Box::new(CountingReservation(Arc::new(AtomicUsize::new(0)))));

        assert_eq!(last.await.unwrap().unwrap().name, "Office");
        assert!(requests.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stop_drops_queued_start() {
        let (controller, mut requests) = controller();
        let closes = Arc::new(AtomicUsize::new(0));

        controller.start_tethering(HotspotRequest::new("Home", "secret123"));
        let (_, callback) = requests.recv().await.unwrap();
        let queued = tokio::spawn({
            let controller = controller.clone();
            async move { controller.start(HotspotRequest::new("Office", "other456")).await }
        });
        tokio::task::yield_now().await;
        controller.status().await.unwrap();

        assert_eq!(controller.stop().await.unwrap(), StopOutcome::CancelledPending);
        assert!(matches!(
            queued.await.unwrap().unwrap_err(),
            HotspotError::Cancelled
        ));

        callback.on_started(Box::new(CountingReservation(closes.clone())));
        assert_eq!(controller.status().await.unwrap().phase, Phase::Idle);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(requests.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_external_stop_clears_session() {
        let (controller, mut requests) = controller();
        let closes = Arc::new(AtomicUsize::new(0));
        let mut states = controller.subscribe();

        controller.start_tethering(HotspotRequest::new("Home", "secret123"));
        let (_, callback) = requests.recv().await.unwrap();
        callback.on_started(Box::new(CountingReservation(closes.clone())));
        callback.on_stopped();

        assert_eq!(states.recv().await, Some(false));
        assert_eq!(states.recv().await, Some(true));
        assert_eq!(states.recv().await, Some(false));
        // Platform already tore it down; nothing left to close.
        assert_eq!(closes.load(Ordering::SeqCst), 0);
        assert_eq!(controller.stop().await.unwrap(), StopOutcome::AlreadyStopped);
    }

    #[tokio::test]
    async fn test_failure_reported_and_state_stays_false() {
        let (controller, mut requests) = controller();
        let mut states = controller.subscribe();

        let start = tokio::spawn({
            let controller = controller.clone();
            async move { controller.start(HotspotRequest::new("Home", "secret123")).await }
        });
        let (_, callback) = requests.recv().await.unwrap();
        callback.on_failed_with(FailureReason::Busy);

        assert!(matches!(
            start.await.unwrap().unwrap_err(),
            HotspotError::ActivationFailed(FailureReason::Busy)
        ));
        assert!(!controller.tether_state());
        assert_eq!(states.try_recv(), Some(false));
        assert_eq!(states.try_recv(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_timeout() {
        let (controller, mut requests) = controller_with(ControllerOptions {
            activation_timeout: Duration::from_secs(5),
            ..ControllerOptions::default()
        });
        let closes = Arc::new(AtomicUsize::new(0));

        let err = controller
            .start(HotspotRequest::new("Home", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HotspotError::ActivationTimedOut { timeout_secs: 5 }
        ));
        assert_eq!(controller.status().await.unwrap().phase, Phase::Idle);

        // A Started that shows up after the timeout is closed, not adopted.
        let (_, callback) = requests.recv().await.unwrap();
        callback.on_started(Box::new(CountingReservation(closes.clone())));
        controller.status().await.unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!controller.tether_state());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_timeouts_close_every_late_session() {
        let (controller, mut requests) = controller_with(ControllerOptions {
            activation_timeout: Duration::from_secs(1),
            ..ControllerOptions::default()
        });
        let closes = Arc::new(AtomicUsize::new(0));

        let mut callbacks = Vec::new();
        for _ in 0..50 {
            let err = controller
                .start(HotspotRequest::new("Home", "secret123"))
                .await
                .unwrap_err();
            assert!(matches!(err, HotspotError::ActivationTimedOut { .. }));
            callbacks.push(requests.recv().await.unwrap().1);
        }

        for callback in &callbacks {
            callback.on_started(Box::new(CountingReservation(closes.clone())));
        }
        assert_eq!(controller.status().await.unwrap().phase, Phase::Idle);
        assert_eq!(closes.load(Ordering::SeqCst), callbacks.len());
        assert!(!controller.tether_state());
    }

    #[tokio::test]
    async fn test_defaults_fill_missing_fields() {
        let (controller, mut requests) = controller_with(ControllerOptions {
            defaults: RequestDefaults {
                security_mode: SecurityMode::Wpa3Sae,
                band: Band::GHZ_5,
                ..RequestDefaults::default()
            },
            ..ControllerOptions::default()
        });

        controller.start_tethering(HotspotRequest::new("Home", "pw"));
        let (config, _callback) = requests.recv().await.unwrap();
        assert_eq!(config.security_type(), SecurityMode::Wpa3Sae.code());
        assert_eq!(config.band(), Band::GHZ_5.bits());
    }

    #[tokio::test]
    async fn test_shutdown_closes_session() {
        let (controller, mut requests) = controller();
        let closes = Arc::new(AtomicUsize::new(0));
        let watch = controller.state_watch();

        controller.start_tethering(HotspotRequest::new("Home", "secret123"));
        let (_, callback) = requests.recv().await.unwrap();
        callback.on_started(Box::new(CountingReservation(closes.clone())));
        controller.status().await.unwrap();
        assert!(watch.current());

        controller.shutdown().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!watch.current());
        assert!(matches!(
            controller.status().await.unwrap_err(),
            HotspotError::ControllerUnavailable
        ));
    }
}
