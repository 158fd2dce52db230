//! Request arbiter.
//!
//! The arbiter runs the "someone wants in" negotiation: ring, then wait for
//! the handset to be picked up or for the deadline to pass. Automatic mode
//! skips the negotiation and opens straight away.
//!
//! ```text
//!            request()                 pickup
//!   Idle ───────────────► Requesting ──────────► Opened ──► Idle
//!     │                     │   ▲  │   deadline
//!     │ (automatic mode)    │   │  └───────────► TimedOut ─► Idle
//!     ▼                     │   │      cancel()
//!   Opened ──► Idle         │   └ request()  ──► Cancelled ► Idle
//!                           └───────────────────┘  (keep-alive)
//! ```
//!
//! All session state sits behind one lock. Pickup, timeout and cancel each
//! resolve the session through the same locked `finish` step, so exactly one
//! of them wins and the losers are no-ops. The session's bell is only ever
//! stopped by the step that resolved it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use autophon_core::constants::{HANGUP_POLL_MS, SHORT_FEEDBACK_MS};
use autophon_door::Door;
use autophon_hardware::Signal;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auto_mode::AutoMode;
use crate::ring::Ring;
use crate::session::{RequestState, SessionMachine, SessionRecord};
use crate::timer::RestartableTimer;

/// Snapshot of the arbiter for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArbiterStatus {
    /// Current session state.
    pub state: RequestState,

    /// Id of the session in progress.
    pub session: Option<u64>,

    /// Whether automatic mode applies right now.
    pub auto_armed: bool,

    /// Configured automatic mode expiry.
    pub auto_until: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct ArbiterState {
    machine: SessionMachine,
    timer: RestartableTimer,
    auto: AutoMode,
    /// Hanger raise count when the current session began.
    hanger_mark: u64,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<ArbiterState>,
    wake: Notify,
    ring: Ring,
    door: Door,
    hanger: Signal,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ArbiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arm_timer(self: &Arc<Self>, state: &mut ArbiterState) {
        let shared = Arc::downgrade(self);
        state.timer.start(move |epoch| {
            if let Some(shared) = shared.upgrade() {
                shared.on_timeout(epoch);
            }
        });
    }

    fn on_timeout(&self, epoch: u64) {
        let mut state = self.lock();
        if !state.timer.take_expiry(epoch) {
            debug!("Stale request timeout ignored");
            return;
        }
        if let Some(record) = self.finish(&mut state, RequestState::TimedOut) {
            info!(session = record.id, outcome = %record.outcome, "Nobody picked up, request timed out");
        }
    }

    /// Resolve session `id` by pickup. Returns `false` if it was already
    /// resolved.
    fn pickup(&self, id: u64) -> bool {
        let mut state = self.lock();
        if state.machine.active_id() != Some(id) {
            return false;
        }
        let record = self.finish(&mut state, RequestState::Opened);
        drop(state);

        if let Some(record) = record {
            info!(session = record.id, outcome = %record.outcome, "Handset picked up, opening the door");
            self.door.open();
            true
        } else {
            false
        }
    }

    /// The single terminal step: disarm, silence, record.
    fn finish(&self, state: &mut ArbiterState, outcome: RequestState) -> Option<SessionRecord> {
        if state.machine.state() != RequestState::Requesting {
            return None;
        }
        state.timer.cancel();
        self.ring.stop();
        match state.machine.finish(outcome) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Failed to close request session: {}", e);
                None
            }
        }
    }

    fn current_session(&self) -> Option<(u64, u64)> {
        let state = self.lock();
        state.machine.active_id().map(|id| (id, state.hanger_mark))
    }

    fn is_active(&self, id: u64) -> bool {
        self.lock().machine.active_id() == Some(id)
    }
}

/// Handle to the request arbiter. Cheap to clone.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use autophon_controller::request::RequestArbiter;
/// use autophon_controller::ring::Ring;
/// use autophon_controller::session::RequestState;
/// use autophon_door::{Door, MockDoorBackend};
/// use autophon_hardware::Signal;
/// use autophon_hardware::mock::MockBell;
///
/// #[tokio::main]
/// async fn main() {
///     let (bell, _bell_handle) = MockBell::new();
///     let (ring, _ring_worker) = Ring::new(bell);
///     let (backend, _door_handle) = MockDoorBackend::new();
///     let (door, _door_worker) = Door::new(backend);
///
///     let (arbiter, _worker) =
///         RequestArbiter::new(ring, door, Signal::new("hanger"), Duration::from_secs(20));
///
///     arbiter.request();
///     assert!(arbiter.is_requesting());
///
///     assert!(arbiter.cancel());
///     assert_eq!(arbiter.state(), RequestState::Idle);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequestArbiter {
    shared: Arc<Shared>,
}

impl RequestArbiter {
    /// Create the arbiter and its pickup worker.
    ///
    /// `hanger` is the pickup signal; `timeout` is the ring-and-wait window.
    pub fn new(ring: Ring, door: Door, hanger: Signal, timeout: Duration) -> (Self, ArbiterWorker) {
        let shared = Arc::new(Shared {
            state: Mutex::new(ArbiterState {
                machine: SessionMachine::new(),
                timer: RestartableTimer::new(timeout),
                auto: AutoMode::default(),
                hanger_mark: 0,
            }),
            wake: Notify::new(),
            ring,
            door,
            hanger,
        });

        let worker = ArbiterWorker {
            shared: Arc::clone(&shared),
            poll: Duration::from_millis(HANGUP_POLL_MS),
        };
        (Self { shared }, worker)
    }

    /// Someone requests entry.
    ///
    /// Starts a ringing session, extends the one in progress, or opens
    /// immediately when automatic mode is armed. Must be called from within
    /// a Tokio runtime.
    pub fn request(&self) {
        let mut state = self.shared.lock();

        if state.machine.state() == RequestState::Requesting {
            let keep_alives = state.machine.keep_alive().unwrap_or_default();
            self.shared.arm_timer(&mut state);
            info!(
                session = ?state.machine.active_id(),
                keep_alives,
                "Request repeated, deadline extended"
            );
            return;
        }

        if state.auto.is_armed_at(Utc::now()) {
            let record = state.machine.open_immediately();
            drop(state);
            match record {
                Ok(record) => {
                    info!(session = record.id, "Automatic mode armed, opening without ringing");
                    self.shared.door.open();
                    let ring = self.shared.ring.clone();
                    tokio::spawn(async move {
                        ring.pulse(Duration::from_millis(SHORT_FEEDBACK_MS)).await;
                    });
                }
                Err(e) => warn!("Failed to record automatic opening: {}", e),
            }
            return;
        }

        match state.machine.begin() {
            Ok(id) => {
                state.hanger_mark = self.shared.hanger.raise_count();
                self.shared.arm_timer(&mut state);
                self.shared.ring.start();
                info!(session = id, timeout = ?state.timer.duration(), "Entry requested, ringing");
            }
            Err(e) => {
                warn!("Failed to start request session: {}", e);
                return;
            }
        }
        drop(state);
        self.shared.wake.notify_one();
    }

    /// Abort the session in progress: stop the timer and the bell.
    ///
    /// Returns `true` if a session was cancelled; a no-op otherwise.
    pub fn cancel(&self) -> bool {
        let mut state = self.shared.lock();
        match self.shared.finish(&mut state, RequestState::Cancelled) {
            Some(record) => {
                info!(session = record.id, outcome = %record.outcome, "Request cancelled");
                true
            }
            None => {
                debug!("Cancel without a request in progress");
                false
            }
        }
    }

    /// Whether a ringing session is in progress.
    pub fn is_requesting(&self) -> bool {
        self.state() == RequestState::Requesting
    }

    /// Current session state.
    pub fn state(&self) -> RequestState {
        self.shared.lock().machine.state()
    }

    /// Arm automatic mode until `until`.
    pub fn activate_auto(&self, until: DateTime<Utc>) {
        self.shared.lock().auto.arm(until);
        if until <= Utc::now() {
            warn!(%until, "Automatic mode armed with an expiry in the past");
        } else {
            info!(%until, "Automatic mode armed");
        }
    }

    /// Disarm automatic mode. Returns `true` if it was armed.
    pub fn cancel_auto(&self) -> bool {
        let was_armed = self.shared.lock().auto.clear(Utc::now());
        if was_armed {
            info!("Automatic mode cleared");
        } else {
            debug!("Automatic mode was not armed");
        }
        was_armed
    }

    /// Current automatic mode setting.
    pub fn auto_mode(&self) -> AutoMode {
        self.shared.lock().auto
    }

    /// Finished sessions, oldest first.
    pub fn history(&self) -> Vec<SessionRecord> {
        self.shared.lock().machine.history().iter().cloned().collect()
    }

    /// Snapshot for status reporting.
    pub fn status(&self) -> ArbiterStatus {
        let state = self.shared.lock();
        ArbiterStatus {
            state: state.machine.state(),
            session: state.machine.active_id(),
            auto_armed: state.auto.is_armed_at(Utc::now()),
            auto_until: state.auto.until(),
        }
    }
}

/// Worker watching the hanger while a session rings.
#[derive(Debug)]
pub struct ArbiterWorker {
    shared: Arc<Shared>,
    poll: Duration,
}

impl ArbiterWorker {
    /// Wait for sessions and resolve them on pickup, until cancelled.
    ///
    /// The hanger is polled every [`HANGUP_POLL_MS`] so a session resolved
    /// elsewhere is noticed. A pickup between two polls is kept by the
    /// subscription and handled on the next one.
    pub async fn run(self, cancel: CancellationToken) {
        debug!("Request arbiter started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = self.shared.wake.notified() => {}
            }

            let Some((id, mark)) = self.shared.current_session() else {
                continue;
            };
            let mut hanger = self.shared.hanger.subscribe_since(mark);
            debug!(session = id, "Waiting for pickup");

            loop {
                let picked_up = tokio::select! {
                    () = cancel.cancelled() => {
                        debug!("Request arbiter stopped");
                        return;
                    }
                    picked_up = hanger.wait_timeout(self.poll) => picked_up,
                };

                if picked_up {
                    if !self.shared.pickup(id) {
                        debug!(session = id, "Pickup after the request was resolved");
                    }
                    break;
                }
                if !self.shared.is_active(id) {
                    break;
                }
            }
        }

        debug!("Request arbiter stopped");
    }
}
