//! Momentary, non-queued signals between input lines and workers.
//!
//! A [`Signal`] behaves like a doorbell wire: raising it wakes whoever is
//! listening at that moment and nothing is stored for latecomers. It is
//! built on [`tokio::sync::Notify::notify_waiters`] plus a raise counter.
//!
//! Workers that poll a signal in a loop would lose edges that land between
//! two waits. They hold a [`Subscription`] instead, which remembers the last
//! raise it has consumed:
//!
//! - a raise with no signal waiter and no subscription is lost;
//! - a raise while a subscriber is busy is seen on its next wait;
//! - several raises while a subscriber is busy are seen once.
//!
//! # Examples
//!
//! ```
//! use autophon_hardware::signal::Signal;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let hanger = Signal::new("hanger");
//!
//!     // Nobody listens: the edge is lost.
//!     hanger.raise();
//!     assert!(!hanger.wait_timeout(Duration::from_millis(10)).await);
//!
//!     // A subscription sees edges raised after it was taken.
//!     let mut sub = hanger.subscribe();
//!     hanger.raise();
//!     assert!(sub.wait_timeout(Duration::from_millis(10)).await);
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

use crate::types::InputLine;

struct Inner {
    name: String,
    raised: AtomicU64,
    notify: Notify,
}

/// A lossy broadcast notification.
///
/// Cloning a `Signal` yields another handle to the same signal.
#[derive(Clone)]
pub struct Signal {
    inner: Arc<Inner>,
}

impl Signal {
    /// Create a new signal with a name used in logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                raised: AtomicU64::new(0),
                notify: Notify::new(),
            }),
        }
    }

    /// Signal name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Wake every current waiter and subscriber.
    pub fn raise(&self) {
        self.inner.raised.fetch_add(1, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Number of times this signal has been raised.
    pub fn raise_count(&self) -> u64 {
        self.inner.raised.load(Ordering::SeqCst)
    }

    /// Wait for the next raise after this call.
    pub async fn wait(&self) {
        self.subscribe().wait().await;
    }

    /// Wait for the next raise after this call, giving up after `timeout`.
    ///
    /// Returns `true` if the signal was raised.
    pub async fn wait_timeout(&self, timeout: Duration) -> bool {
        self.subscribe().wait_timeout(timeout).await
    }

    /// Start observing raises from now on.
    pub fn subscribe(&self) -> Subscription {
        self.subscribe_since(self.raise_count())
    }

    /// Observe every raise after the `count`-th one, as if subscribed when
    /// [`raise_count`](Self::raise_count) returned `count`.
    pub fn subscribe_since(&self, count: u64) -> Subscription {
        Subscription {
            seen: count,
            signal: self.clone(),
        }
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.inner.name)
            .field("raised", &self.raise_count())
            .finish()
    }
}

/// A persistent observer of a [`Signal`].
///
/// Raises that happen while the owner is not waiting are kept, coalesced
/// into a single pending wake-up.
#[derive(Debug)]
pub struct Subscription {
    signal: Signal,
    seen: u64,
}

impl Subscription {
    /// Wait until the signal has been raised since the last consumed raise.
    ///
    /// Cancel safe: dropping the future consumes nothing.
    pub async fn wait(&mut self) {
        loop {
            let notified = self.signal.inner.notify.notified();
            tokio::pin!(notified);
            // Register before reading the counter so a raise in between
            // still wakes us.
            notified.as_mut().enable();

            let current = self.signal.inner.raised.load(Ordering::SeqCst);
            if current != self.seen {
                self.seen = current;
                return;
            }

            notified.await;
        }
    }

    /// Like [`wait`](Self::wait), bounded by `timeout`.
    ///
    /// Returns `true` if a raise was consumed.
    pub async fn wait_timeout(&mut self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }

    /// Whether a raise is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        self.signal.raise_count() != self.seen
    }

    /// Drop any pending raise.
    pub fn resync(&mut self) {
        self.seen = self.signal.raise_count();
    }

    /// The observed signal.
    pub fn signal(&self) -> &Signal {
        &self.signal
    }
}

/// One signal per input line.
#[derive(Debug, Clone)]
pub struct SignalBoard {
    pub pusher: Signal,
    pub hanger: Signal,
    pub dialer: Signal,
    pub pulse: Signal,
}

impl SignalBoard {
    /// Create a board with fresh signals.
    pub fn new() -> Self {
        Self {
            pusher: Signal::new(InputLine::Pusher.to_string()),
            hanger: Signal::new(InputLine::Hanger.to_string()),
            dialer: Signal::new(InputLine::Dialer.to_string()),
            pulse: Signal::new(InputLine::Pulse.to_string()),
        }
    }

    /// Signal of the given line.
    pub fn get(&self, line: InputLine) -> &Signal {
        match line {
            InputLine::Pusher => &self.pusher,
            InputLine::Hanger => &self.hanger,
            InputLine::Dialer => &self.dialer,
            InputLine::Pulse => &self.pulse,
        }
    }
}

impl Default for SignalBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test(start_paused = true)]
    async fn test_raise_without_waiter_is_lost() {
        let signal = Signal::new("test");
        signal.raise();
        assert!(!signal.wait_timeout(SHORT).await);
        assert_eq!(signal.raise_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_raise_wakes_current_waiter() {
        let signal = Signal::new("test");
        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move { signal.wait_timeout(Duration::from_secs(1)).await }
        });

        // Let the waiters park before raising.
        tokio::time::sleep(Duration::from_millis(1)).await;
        signal.raise();

        assert!(waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_raise_wakes_all_waiters() {
        let signal = Signal::new("test");
        let mut waiters = Vec::new();
        for _ in 0..3 {
            let signal = signal.clone();
            waiters.push(tokio::spawn(async move {
                signal.wait_timeout(Duration::from_secs(1)).await
            }));
        }

        // Let the waiters park before raising.
        tokio::time::sleep(Duration::from_millis(1)).await;
        signal.raise();

        for waiter in waiters {
            assert!(waiter.await.unwrap());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_keeps_raise_while_busy() {
        let signal = Signal::new("test");
        let mut sub = signal.subscribe();

        // Subscriber is "busy": not waiting when the edge arrives.
        signal.raise();
        assert!(sub.is_pending());

        assert!(sub.wait_timeout(SHORT).await);
        assert!(!sub.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_coalesces_raises() {
        let signal = Signal::new("test");
        let mut sub = signal.subscribe();

        signal.raise();
        signal.raise();

        assert!(sub.wait_timeout(SHORT).await);
        assert!(!sub.wait_timeout(SHORT).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_ignores_earlier_raises() {
        let signal = Signal::new("test");
        signal.raise();

        let mut sub = signal.subscribe();
        assert!(!sub.wait_timeout(SHORT).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_resync_drops_pending() {
        let signal = Signal::new("test");
        let mut sub = signal.subscribe();

        signal.raise();
        sub.resync();

        assert!(!sub.wait_timeout(SHORT).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_since_sees_later_raises() {
        let signal = Signal::new("test");
        signal.raise();
        let mark = signal.raise_count();
        signal.raise();

        let mut sub = signal.subscribe_since(mark);
        assert!(sub.wait_timeout(SHORT).await);
        assert!(!sub.wait_timeout(SHORT).await);
    }

    #[test]
    fn test_board_routes_lines() {
        let board = SignalBoard::new();
        for line in InputLine::ALL {
            assert_eq!(board.get(line).name(), line.to_string());
        }
    }
}
