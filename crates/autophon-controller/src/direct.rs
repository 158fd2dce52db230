//! Direct override: the local push-button.
//!
//! Every press opens the door, pre-empting a ringing request first, and
//! acknowledges with a short ring.

use std::time::Duration;

use autophon_core::constants::SHORT_FEEDBACK_MS;
use autophon_door::Door;
use autophon_hardware::{Signal, Subscription};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::request::RequestArbiter;
use crate::ring::Ring;

/// Worker handling push-button presses.
#[derive(Debug)]
pub struct DirectOverride {
    pusher: Subscription,
    arbiter: RequestArbiter,
    door: Door,
    ring: Ring,
}

impl DirectOverride {
    /// Create the worker listening on `pusher`.
    pub fn new(pusher: &Signal, arbiter: RequestArbiter, door: Door, ring: Ring) -> Self {
        Self {
            pusher: pusher.subscribe(),
            arbiter,
            door,
            ring,
        }
    }

    /// Handle presses until cancelled.
    ///
    /// Presses during the feedback ring are coalesced into one.
    pub async fn run(mut self, cancel: CancellationToken) {
        debug!("Direct override started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = self.pusher.wait() => self.press().await,
            }
        }

        debug!("Direct override stopped");
    }

    async fn press(&self) {
        if self.arbiter.is_requesting() {
            info!("Push-button pre-empts the pending request");
            self.arbiter.cancel();
        }
        info!("Push-button pressed, opening the door");
        self.door.open();
        self.ring.pulse(Duration::from_millis(SHORT_FEEDBACK_MS)).await;
    }
}
