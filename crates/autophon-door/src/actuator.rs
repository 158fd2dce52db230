//! Fire-and-forget door actuator.
//!
//! [`Door`] is the cheap, cloneable trigger handed to every component that
//! may unlock the door. The matching [`DoorWorker`] owns the backend and runs
//! on its own task, so the latency of the HTTP calls never reaches the ring
//! or request logic.
//!
//! ```text
//! Arbiter ──┐
//!           ├── open() ──► [busy flag + permit] ──► DoorWorker ──► DoorBackend
//! Direct  ──┘                                            │
//!                                                        └──► DoorStats (watch)
//! ```
//!
//! # Examples
//!
//! ```
//! use autophon_door::actuator::Door;
//! use autophon_door::backend::MockDoorBackend;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (backend, handle) = MockDoorBackend::new();
//!     let (door, worker) = Door::new(backend);
//!     let cancel = CancellationToken::new();
//!     let task = tokio::spawn(worker.run(cancel.clone()));
//!
//!     let mut stats = door.subscribe();
//!     door.open();
//!     stats.wait_for(|s| s.attempts == 1).await.unwrap();
//!
//!     assert_eq!(handle.calls(), 1);
//!     cancel.cancel();
//!     task.await.unwrap();
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::{Notify, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::backend::DoorBackend;

/// Outcome of one unlock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorOutcome {
    /// The backend confirmed the unlock.
    Opened,

    /// The backend refused or could not be reached.
    Failed,
}

impl fmt::Display for DoorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opened => write!(f, "opened"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Running counters of the door actuator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DoorStats {
    /// Unlock attempts performed.
    pub attempts: u64,

    /// Attempts that opened the door.
    pub successes: u64,

    /// Attempts that failed.
    pub failures: u64,

    /// `open()` calls dropped because an attempt was already in flight.
    pub coalesced: u64,

    /// Outcome of the most recent attempt.
    pub last_outcome: Option<DoorOutcome>,
}

#[derive(Debug)]
struct Shared {
    /// Set from `open()` until the worker finishes the attempt.
    busy: AtomicBool,
    trigger: Notify,
    stats: watch::Sender<DoorStats>,
}

/// Trigger side of the door actuator.
#[derive(Debug, Clone)]
pub struct Door {
    shared: Arc<Shared>,
}

impl Door {
    /// Create the trigger and the worker that owns `backend`.
    pub fn new<B: DoorBackend>(backend: B) -> (Self, DoorWorker<B>) {
        let (stats, _) = watch::channel(DoorStats::default());
        let shared = Arc::new(Shared {
            busy: AtomicBool::new(false),
            trigger: Notify::new(),
            stats,
        });

        let door = Self {
            shared: Arc::clone(&shared),
        };
        (door, DoorWorker { shared, backend })
    }

    /// Request one unlock attempt and return immediately.
    ///
    /// A call while an attempt is pending or in flight is coalesced into it.
    pub fn open(&self) {
        let claimed = self
            .shared
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if claimed {
            // The permit is stored if the worker is not waiting yet.
            self.shared.trigger.notify_one();
        } else {
            debug!("Door open already in progress, request coalesced");
            self.shared.stats.send_modify(|stats| stats.coalesced += 1);
        }
    }

    /// Whether an unlock attempt is pending or in flight.
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> DoorStats {
        self.shared.stats.borrow().clone()
    }

    /// Watch the counters; a new value is published after every attempt.
    pub fn subscribe(&self) -> watch::Receiver<DoorStats> {
        self.shared.stats.subscribe()
    }
}

/// Worker side of the door actuator.
#[derive(Debug)]
pub struct DoorWorker<B> {
    shared: Arc<Shared>,
    backend: B,
}

impl<B: DoorBackend> DoorWorker<B> {
    /// Perform unlock attempts until cancelled.
    ///
    /// Failures are logged and counted; the worker keeps waiting for the
    /// next trigger.
    pub async fn run(self, cancel: CancellationToken) {
        debug!("Door worker started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Door worker stopped");
                    return;
                }
                () = self.shared.trigger.notified() => self.attempt().await,
            }
        }
    }

    async fn attempt(&self) {
        info!("Opening the door");

        let outcome = match self.backend.unlock().await {
            Ok(()) => {
                info!(outcome = %DoorOutcome::Opened, "Door opened");
                DoorOutcome::Opened
            }
            Err(e) => {
                error!(outcome = %DoorOutcome::Failed, "Failed to open the door: {}", e);
                DoorOutcome::Failed
            }
        };

        // Release before publishing, so an observer of the new stats can
        // trigger the next attempt.
        self.shared.busy.store(false, Ordering::Release);
        self.shared.stats.send_modify(|stats| {
            stats.attempts += 1;
            match outcome {
                DoorOutcome::Opened => stats.successes += 1,
                DoorOutcome::Failed => stats.failures += 1,
            }
            stats.last_outcome = Some(outcome);
        });
    }
}
