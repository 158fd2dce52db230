//! Autophon controller.
//!
//! Five always-running workers coordinate through momentary signals and a
//! few direct calls:
//!
//! ```text
//!  remote request ──► RequestArbiter ──────► Ring ──► bell
//!                        ▲   │  ▲
//!  hanger ───────────────┘   │  └── activate_auto / cancel_auto
//!                            ▼                         │
//!  pusher ──► DirectOverride ──► Door ──► backend   DialDecoder ◄── dialer, pulse
//! ```
//!
//! [`Autophon`] wires the components together at startup and owns their
//! tasks; there is no global state.
//!
//! # Examples
//!
//! ```no_run
//! use autophon_controller::{Autophon, Devices, Settings};
//! use autophon_door::{AnyDoorBackend, MockDoorBackend};
//! use autophon_hardware::mock::{MockBell, MockInputs};
//! use autophon_hardware::{AnyBell, AnyEdgeSource};
//!
//! #[tokio::main]
//! async fn main() -> autophon_controller::Result<()> {
//!     let (inputs, _inputs_handle) = MockInputs::new();
//!     let (bell, _bell_handle) = MockBell::new();
//!     let (door, _door_handle) = MockDoorBackend::new();
//!
//!     let autophon = Autophon::start(
//!         Settings::default(),
//!         Devices {
//!             inputs: AnyEdgeSource::Mock(inputs),
//!             bell: AnyBell::Mock(bell),
//!             door: AnyDoorBackend::Mock(door),
//!         },
//!     );
//!
//!     autophon.request();
//!     autophon.shutdown().await
//! }
//! ```

pub mod auto_mode;
pub mod dial;
pub mod direct;
pub mod error;
pub mod request;
pub mod ring;
pub mod session;
pub mod timer;

use std::time::Duration;

use autophon_core::{AdminCodes, Config};
use autophon_door::{AnyDoorBackend, Door, DoorStats};
use autophon_hardware::{AnyBell, AnyEdgeSource, InputDispatcher, SignalBoard};
use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub use dial::{DialAccumulator, DialDecoder, DialTiming};
pub use direct::DirectOverride;
pub use error::{ControllerError, Result};
pub use request::{ArbiterStatus, ArbiterWorker, RequestArbiter};
pub use ring::{Ring, RingCadence, RingWorker};
pub use session::{RequestState, SessionMachine, SessionRecord};

/// Controller settings taken from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Admin dial codes.
    pub codes: AdminCodes,

    /// Ring-and-wait window of a request.
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            codes: AdminCodes::default(),
            request_timeout: Duration::from_secs(
                autophon_core::constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
        }
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            codes: config.codes.clone(),
            request_timeout: config.request_timeout,
        }
    }
}

/// The devices the controller drives.
#[derive(Debug)]
pub struct Devices {
    /// Source of input line edges.
    pub inputs: AnyEdgeSource,

    /// Bell output.
    pub bell: AnyBell,

    /// Door-lock backend.
    pub door: AnyDoorBackend,
}

/// Snapshot of the whole controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Request arbiter state and automatic mode.
    pub arbiter: ArbiterStatus,

    /// Whether the bell is wanted on.
    pub ringing: bool,

    /// Door actuator counters.
    pub door: DoorStats,
}

/// The running autophon: every worker plus the handles to reach them.
#[derive(Debug)]
pub struct Autophon {
    board: SignalBoard,
    ring: Ring,
    door: Door,
    arbiter: RequestArbiter,
    cancel: CancellationToken,
    tasks: JoinSet<(&'static str, Result<()>)>,
}

impl Autophon {
    /// Wire the components and spawn their workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(settings: Settings, devices: Devices) -> Self {
        let cancel = CancellationToken::new();
        let board = SignalBoard::new();

        let (ring, ring_worker) = Ring::new(devices.bell);
        let (door, door_worker) = Door::new(devices.door);
        let (arbiter, arbiter_worker) = RequestArbiter::new(
            ring.clone(),
            door.clone(),
            board.hanger.clone(),
            settings.request_timeout,
        );
        let decoder = DialDecoder::new(&board, settings.codes, arbiter.clone(), ring.clone());
        let direct = DirectOverride::new(&board.pusher, arbiter.clone(), door.clone(), ring.clone());
        let dispatcher = InputDispatcher::new(devices.inputs, board.clone());

        let mut autophon = Self {
            board,
            ring,
            door,
            arbiter,
            cancel,
            tasks: JoinSet::new(),
        };

        let cancel = autophon.cancel.clone();
        autophon.spawn("ring", ring_worker.run(cancel.clone()));
        autophon.spawn("door", async move {
            door_worker.run(cancel).await;
            Ok(())
        });

        let cancel = autophon.cancel.clone();
        autophon.spawn("request", async move {
            arbiter_worker.run(cancel).await;
            Ok(())
        });

        let cancel = autophon.cancel.clone();
        autophon.spawn("dial", async move {
            decoder.run(cancel).await;
            Ok(())
        });

        let cancel = autophon.cancel.clone();
        autophon.spawn("direct", async move {
            direct.run(cancel).await;
            Ok(())
        });

        let cancel = autophon.cancel.clone();
        autophon.spawn("inputs", async move { Ok(dispatcher.run(cancel).await?) });

        info!(version = autophon_core::VERSION, "Autophon started");
        autophon
    }

    fn spawn<F>(&mut self, name: &'static str, worker: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.tasks.spawn(async move { (name, worker.await) });
    }

    /// A remote entry request arrived.
    pub fn request(&self) {
        self.arbiter.request();
    }

    /// The request arbiter.
    pub fn arbiter(&self) -> &RequestArbiter {
        &self.arbiter
    }

    /// The ring controller.
    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    /// The door actuator.
    pub fn door(&self) -> &Door {
        &self.door
    }

    /// The input signals.
    pub fn board(&self) -> &SignalBoard {
        &self.board
    }

    /// Snapshot of the controller.
    pub fn status(&self) -> Status {
        Status {
            arbiter: self.arbiter.status(),
            ringing: self.ring.is_active(),
            door: self.door.stats(),
        }
    }

    /// Wait until a worker ends.
    ///
    /// Workers run for the life of the controller, so this only returns on
    /// failure or after cancellation. Cancel safe.
    ///
    /// # Errors
    ///
    /// Returns the worker's error, or `ControllerError::WorkerStopped` if it
    /// ended without one.
    pub async fn wait(&mut self) -> Result<()> {
        match self.tasks.join_next().await {
            None => Ok(()),
            Some(Ok((_, Ok(())))) if self.cancel.is_cancelled() => Ok(()),
            Some(Ok((name, Ok(())))) => Err(ControllerError::worker_stopped(name)),
            Some(Ok((name, Err(e)))) => {
                error!(worker = name, "Worker failed: {}", e);
                Err(e)
            }
            Some(Err(e)) => Err(ControllerError::task(e.to_string())),
        }
    }

    /// Cancel every worker and wait for them to finish.
    ///
    /// # Errors
    ///
    /// Returns the first worker error encountered.
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Autophon shutting down");
        self.cancel.cancel();

        let mut result = Ok(());
        while let Some(joined) = self.tasks.join_next().await {
            let outcome = match joined {
                Ok((_, outcome)) => outcome,
                Err(e) => Err(ControllerError::task(e.to_string())),
            };
            if let Err(e) = outcome
                && result.is_ok()
            {
                result = Err(e);
            }
        }

        info!("Autophon stopped");
        result
    }
}
