//! Single-shot, cancellable, reschedulable timer.
//!
//! Each arming spawns one sleeping task tagged with an epoch. Restarting or
//! cancelling aborts that task and bumps the epoch. Abort does not wait for
//! the task, so the expiry callback receives its epoch and the owner checks
//! it with [`RestartableTimer::take_expiry`] under the same lock that guards
//! restarts; a stale expiry is then a no-op.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Restartable single-shot timer.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
/// use autophon_controller::timer::RestartableTimer;
///
/// #[tokio::main]
/// async fn main() {
///     let timer = Arc::new(Mutex::new(RestartableTimer::new(Duration::from_millis(20))));
///     let fired = Arc::new(Mutex::new(false));
///
///     let (t, f) = (Arc::clone(&timer), Arc::clone(&fired));
///     timer.lock().unwrap().start(move |epoch| {
///         if t.lock().unwrap().take_expiry(epoch) {
///             *f.lock().unwrap() = true;
///         }
///     });
///
///     tokio::time::sleep(Duration::from_millis(50)).await;
///     assert!(*fired.lock().unwrap());
/// }
/// ```
#[derive(Debug)]
pub struct RestartableTimer {
    duration: Duration,
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

impl RestartableTimer {
    /// Create a disarmed timer.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            epoch: 0,
            task: None,
        }
    }

    /// Time from arming to expiry.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Arm the timer, replacing any pending expiry.
    ///
    /// `on_expiry` runs on a spawned task with the epoch of this arming.
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(&mut self, on_expiry: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();
        let epoch = self.epoch;
        let duration = self.duration;
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            on_expiry(epoch);
        }));
        epoch
    }

    /// Disarm the timer. A no-op when not armed.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Whether an expiry is pending.
    pub fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    /// Accept the expiry of arming `epoch`.
    ///
    /// Returns `true` and disarms the timer if `epoch` is the current arming;
    /// returns `false` for an expiry that was cancelled or restarted.
    pub fn take_expiry(&mut self, epoch: u64) -> bool {
        if self.task.is_none() || self.epoch != epoch {
            return false;
        }
        self.task = None;
        self.epoch = self.epoch.wrapping_add(1);
        true
    }
}

impl Drop for RestartableTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
