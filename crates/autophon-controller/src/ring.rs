//! Ring controller.
//!
//! [`Ring`] holds the "wanted on" flag; [`RingWorker`] owns the bell output
//! and toggles it on a fixed duty cycle while the flag is set.
//!
//! Start and stop are last-writer-wins: there is no counting of holders, so
//! a `stop()` from one component silences a ring started by another.
//!
//! ```text
//!            ┌── 500 ms ──┐┌──────── 1500 ms ────────┐
//! bell  ─────┘            └──────────────────────────┘┌────
//!            ^ start()                                 ...
//! ```

use std::sync::Arc;
use std::time::Duration;

use autophon_core::constants::{RING_OFF_MS, RING_ON_MS};
use autophon_hardware::traits::BellOutput;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::Result;

/// On/off phases of the ring cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingCadence {
    /// Time the bell line is driven high.
    pub on: Duration,

    /// Time the bell line is low between two rings.
    pub off: Duration,
}

impl Default for RingCadence {
    fn default() -> Self {
        Self {
            on: Duration::from_millis(RING_ON_MS),
            off: Duration::from_millis(RING_OFF_MS),
        }
    }
}

/// Control side of the ring controller.
#[derive(Debug, Clone)]
pub struct Ring {
    wanted: Arc<watch::Sender<bool>>,
}

impl Ring {
    /// Create the controller and the worker that owns `bell`.
    pub fn new<B: BellOutput>(bell: B) -> (Self, RingWorker<B>) {
        Self::with_cadence(bell, RingCadence::default())
    }

    /// Create the controller with a custom cadence.
    pub fn with_cadence<B: BellOutput>(bell: B, cadence: RingCadence) -> (Self, RingWorker<B>) {
        let (wanted, wanted_rx) = watch::channel(false);
        let ring = Self {
            wanted: Arc::new(wanted),
        };
        let worker = RingWorker {
            wanted: wanted_rx,
            bell,
            cadence,
        };
        (ring, worker)
    }

    /// Mark the bell wanted on.
    pub fn start(&self) {
        self.wanted.send_replace(true);
    }

    /// Mark the bell wanted off.
    pub fn stop(&self) {
        self.wanted.send_replace(false);
    }

    /// Whether the bell is currently wanted on.
    pub fn is_active(&self) -> bool {
        *self.wanted.borrow()
    }

    /// Ring for `duration`, then stop.
    pub async fn pulse(&self, duration: Duration) {
        self.start();
        tokio::time::sleep(duration).await;
        self.stop();
    }
}

/// Worker side of the ring controller.
#[derive(Debug)]
pub struct RingWorker<B> {
    wanted: watch::Receiver<bool>,
    bell: B,
    cadence: RingCadence,
}

impl<B: BellOutput> RingWorker<B> {
    /// Drive the bell until cancelled.
    ///
    /// # Errors
    ///
    /// Returns the hardware error if the bell line cannot be written.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        debug!("Ring worker started");
        self.bell.set_level(false).await?;

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                wanted = wait_level(&mut self.wanted, true) => {
                    if !wanted {
                        break;
                    }
                }
            }

            debug!("Ringing");
            self.ring(&cancel).await?;
            self.bell.set_level(false).await?;
            debug!("Ringing stopped");
        }

        self.bell.set_level(false).await?;
        debug!("Ring worker stopped");
        Ok(())
    }

    async fn ring(&mut self, cancel: &CancellationToken) -> Result<()> {
        loop {
            trace!("Bell on");
            self.bell.set_level(true).await?;
            if !self.hold(self.cadence.on, cancel).await {
                return Ok(());
            }

            trace!("Bell off");
            self.bell.set_level(false).await?;
            if !self.hold(self.cadence.off, cancel).await {
                return Ok(());
            }
        }
    }

    /// Keep the current level for `phase`. Returns `false` as soon as the
    /// bell is no longer wanted.
    async fn hold(&mut self, phase: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            () = cancel.cancelled() => false,
            _ = wait_level(&mut self.wanted, false) => false,
            () = tokio::time::sleep(phase) => true,
        }
    }
}

/// Wait until the wanted flag equals `level`. Returns `false` if every
/// [`Ring`] is gone.
async fn wait_level(wanted: &mut watch::Receiver<bool>, level: bool) -> bool {
    wanted.wait_for(|on| *on == level).await.is_ok()
}

#[cfg(test)]
mod tests {
    use autophon_hardware::mock::{MockBell, MockBellHandle};

    use super::*;

    fn spawn_ring() -> (Ring, MockBellHandle, CancellationToken, tokio::task::JoinHandle<Result<()>>) {
        let (bell, handle) = MockBell::new();
        let (ring, worker) = Ring::new(bell);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(worker.run(cancel.clone()));
        (ring, handle, cancel, task)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_follows_duty_cycle() {
        let (ring, bell, cancel, task) = spawn_ring();

        ring.start();
        settle().await;
        assert!(bell.is_on());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!bell.is_on());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(bell.is_on());
        assert_eq!(bell.ring_count(), 2);

        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_silences_within_phase() {
        let (ring, bell, cancel, task) = spawn_ring();

        ring.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(bell.is_on());

        ring.stop();
        settle().await;
        assert!(!bell.is_on());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(bell.ring_count(), 1);

        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_redundant_calls_last_writer_wins() {
        let (ring, bell, cancel, task) = spawn_ring();

        ring.start();
        ring.start();
        settle().await;
        assert!(ring.is_active());
        assert_eq!(bell.ring_count(), 1);

        ring.stop();
        ring.stop();
        settle().await;
        assert!(!ring.is_active());
        assert!(!bell.is_on());

        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pulse_rings_once() {
        let (ring, bell, cancel, task) = spawn_ring();

        let pulse = tokio::spawn({
            let ring = ring.clone();
            async move { ring.pulse(Duration::from_millis(250)).await }
        });
        settle().await;
        assert!(bell.is_on());

        pulse.await.unwrap();
        settle().await;
        assert!(!bell.is_on());
        assert_eq!(bell.ring_count(), 1);

        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_leaves_bell_off() {
        let (ring, bell, cancel, task) = spawn_ring();

        ring.start();
        settle().await;
        cancel.cancel();
        task.await.unwrap().unwrap();

        assert!(!bell.is_on());
    }
}
