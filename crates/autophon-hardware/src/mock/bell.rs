//! Mock bell output for testing and simulation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::watch;
use tracing::trace;

use crate::{
    HardwareError, Result,
    traits::BellOutput,
    types::DeviceInfo,
};

/// Mock bell that records its output level.
///
/// The paired [`MockBellHandle`] observes the level and counts rings
/// (low-to-high transitions).
///
/// # Examples
///
/// ```
/// use autophon_hardware::mock::MockBell;
/// use autophon_hardware::traits::BellOutput;
///
/// #[tokio::main]
/// async fn main() -> autophon_hardware::Result<()> {
///     let (mut bell, handle) = MockBell::new();
///
///     bell.set_level(true).await?;
///     assert!(handle.is_on());
///     bell.set_level(false).await?;
///
///     assert_eq!(handle.ring_count(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockBell {
    level_tx: watch::Sender<bool>,
    rings: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    name: String,
}

impl MockBell {
    /// Create a new mock bell with the default name.
    pub fn new() -> (Self, MockBellHandle) {
        Self::with_name("Mock Bell".to_string())
    }

    /// Create a new mock bell with a custom name.
    pub fn with_name(name: String) -> (Self, MockBellHandle) {
        let (level_tx, level_rx) = watch::channel(false);
        let rings = Arc::new(AtomicUsize::new(0));
        let failing = Arc::new(AtomicBool::new(false));

        let bell = Self {
            level_tx,
            rings: Arc::clone(&rings),
            failing: Arc::clone(&failing),
            name,
        };

        let handle = MockBellHandle {
            level_rx,
            rings,
            failing,
        };
        (bell, handle)
    }
}

impl BellOutput for MockBell {
    async fn set_level(&mut self, on: bool) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HardwareError::communication(format!("{} output stuck", self.name)));
        }
        let was_on = *self.level_tx.borrow();
        if on && !was_on {
            self.rings.fetch_add(1, Ordering::SeqCst);
        }
        trace!(bell = %self.name, on, "Bell level");
        // send_replace keeps working without receivers
        self.level_tx.send_replace(on);
        Ok(())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Bell v1.0"))
    }
}

/// Handle for observing a [`MockBell`].
#[derive(Debug, Clone)]
pub struct MockBellHandle {
    level_rx: watch::Receiver<bool>,
    rings: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl MockBellHandle {
    /// Current output level.
    pub fn is_on(&self) -> bool {
        *self.level_rx.borrow()
    }

    /// Number of low-to-high transitions so far.
    pub fn ring_count(&self) -> usize {
        self.rings.load(Ordering::SeqCst)
    }

    /// Make every following `set_level` fail with a communication error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Wait until the bell reaches `level`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bell has been dropped.
    pub async fn wait_for_level(&mut self, level: bool) -> Result<()> {
        self.level_rx
            .wait_for(|on| *on == level)
            .await
            .map(|_| ())
            .map_err(|_| HardwareError::disconnected("Bell dropped"))
    }
}
