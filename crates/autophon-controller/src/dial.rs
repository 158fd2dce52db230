//! Rotary dial decoder.
//!
//! A rotary dial reports each digit as a dialer start followed by a train
//! of pulses; one to nine pulses encode digits 1-9 and ten pulses encode 0.
//!
//! ```text
//! dialer  ─┐                          ┌─
//! pulse    └─┐ ┐ ┐ ─ ─ ─(200 ms)─ ─ ─ ─└─┐ ┐ ─ ─ ─ ─(2 s)─ ─ ─► finalize
//!            3 pulses → digit 3           2 pulses → digit 2
//! ```
//!
//! A digit closes after [`PULSE_GAP_MS`] without a pulse; the number closes
//! after [`DIGIT_GAP_MS`] without a new dialer start and is then matched
//! against the [`AdminCodes`]. A dialer start with no pulse within
//! [`DIAL_WATCHDOG_SECS`] abandons the session.

use std::fmt;
use std::time::Duration;

use autophon_core::constants::{
    DIAL_FEEDBACK_MS, DIAL_WATCHDOG_SECS, DIGIT_GAP_MS, MAX_DIAL_DIGITS, PULSE_GAP_MS,
};
use autophon_core::{AdminCodes, DialCommand, Error, Result, digit_from_pulses};
use autophon_hardware::{SignalBoard, Subscription};
use chrono::{TimeDelta, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::request::RequestArbiter;
use crate::ring::Ring;

/// Digits collected during one dial session.
///
/// # Examples
///
/// ```
/// use autophon_controller::dial::DialAccumulator;
/// use autophon_core::{AdminCodes, DialCommand};
///
/// let mut acc = DialAccumulator::new();
/// for pulses in [4, 2, 10] {
///     acc.push_pulses(pulses).unwrap();
/// }
///
/// assert_eq!(acc.to_string(), "420");
/// assert_eq!(
///     acc.interpret(&AdminCodes::default()),
///     Some(DialCommand::OpenFor { hours: 0 })
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct DialAccumulator {
    digits: Vec<u8>,
    invalid: bool,
    last_digit_at: Option<Instant>,
}

impl DialAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Close a digit from its pulse count.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPulseCount` for more than ten pulses and
    /// `Error::InvalidDialCode` past [`MAX_DIAL_DIGITS`]. Either error marks
    /// the whole session invalid.
    pub fn push_pulses(&mut self, pulses: u32) -> Result<u8> {
        let digit = match digit_from_pulses(pulses) {
            Ok(digit) => digit,
            Err(e) => {
                self.invalid = true;
                return Err(e);
            }
        };
        if self.digits.len() >= MAX_DIAL_DIGITS {
            self.invalid = true;
            return Err(Error::InvalidDialCode(format!(
                "more than {MAX_DIAL_DIGITS} digits"
            )));
        }
        self.digits.push(digit);
        self.last_digit_at = Some(Instant::now());
        Ok(digit)
    }

    /// Digits closed so far.
    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    /// Whether every digit so far was well-formed.
    pub fn is_valid(&self) -> bool {
        !self.invalid
    }

    /// When the last digit closed.
    pub fn last_digit_at(&self) -> Option<Instant> {
        self.last_digit_at
    }

    /// Match the finished number against the admin codes.
    pub fn interpret(&self, codes: &AdminCodes) -> Option<DialCommand> {
        if self.invalid {
            return None;
        }
        codes.match_digits(&self.digits)
    }
}

impl fmt::Display for DialAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for digit in &self.digits {
            write!(f, "{digit}")?;
        }
        if self.invalid {
            write!(f, "?")?;
        }
        Ok(())
    }
}

/// Timing windows of the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialTiming {
    /// Silence that closes a digit.
    pub pulse_gap: Duration,

    /// Silence that closes the number.
    pub digit_gap: Duration,

    /// Time from a dialer start to its first pulse.
    pub watchdog: Duration,

    /// Ring pulse acknowledging a valid code.
    pub feedback: Duration,
}

impl Default for DialTiming {
    fn default() -> Self {
        Self {
            pulse_gap: Duration::from_millis(PULSE_GAP_MS),
            digit_gap: Duration::from_millis(DIGIT_GAP_MS),
            watchdog: Duration::from_secs(DIAL_WATCHDOG_SECS),
            feedback: Duration::from_millis(DIAL_FEEDBACK_MS),
        }
    }
}

/// Worker decoding dialed numbers into admin commands.
#[derive(Debug)]
pub struct DialDecoder {
    dialer: Subscription,
    pulse: Subscription,
    codes: AdminCodes,
    arbiter: RequestArbiter,
    ring: Ring,
    timing: DialTiming,
}

impl DialDecoder {
    /// Create a decoder listening on the board's dialer and pulse lines.
    ///
    /// Edges raised after this call are seen even before [`run`](Self::run)
    /// starts.
    pub fn new(board: &SignalBoard, codes: AdminCodes, arbiter: RequestArbiter, ring: Ring) -> Self {
        Self {
            dialer: board.dialer.subscribe(),
            pulse: board.pulse.subscribe(),
            codes,
            arbiter,
            ring,
            timing: DialTiming::default(),
        }
    }

    /// Override the timing windows.
    pub fn with_timing(mut self, timing: DialTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Decode dial sessions until cancelled.
    pub async fn run(mut self, cancel: CancellationToken) {
        debug!("Dial decoder started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                () = self.dialer.wait() => {}
            }

            let session = tokio::select! {
                () = cancel.cancelled() => break,
                session = self.collect() => session,
            };

            if let Some(acc) = session {
                self.apply(&acc);
            }
        }

        debug!("Dial decoder stopped");
    }

    /// Collect digits after a dialer start until the number closes.
    async fn collect(&mut self) -> Option<DialAccumulator> {
        let mut acc = DialAccumulator::new();

        loop {
            // Pulses from before this dialer start are noise.
            self.pulse.resync();

            let Some(pulses) = self.count_pulses().await else {
                warn!(
                    digits = %acc,
                    "Dial started but no pulse within {:?}, session discarded",
                    self.timing.watchdog
                );
                return None;
            };

            match acc.push_pulses(pulses) {
                Ok(digit) => debug!(digit, pulses, "Digit dialed"),
                Err(e) => warn!("Dialed digit rejected: {}", e),
            }

            if !self.dialer.wait_timeout(self.timing.digit_gap).await {
                return Some(acc);
            }
        }
    }

    async fn count_pulses(&mut self) -> Option<u32> {
        if !self.pulse.wait_timeout(self.timing.watchdog).await {
            return None;
        }
        let mut pulses: u32 = 1;
        while self.pulse.wait_timeout(self.timing.pulse_gap).await {
            pulses = pulses.saturating_add(1);
        }
        Some(pulses)
    }

    fn apply(&self, acc: &DialAccumulator) {
        match acc.interpret(&self.codes) {
            Some(DialCommand::OpenFor { hours }) => {
                info!(code = %acc, hours, "Open code dialed");
                let until = Utc::now() + TimeDelta::hours(i64::from(hours));
                self.arbiter.activate_auto(until);
                self.acknowledge();
            }
            Some(DialCommand::CancelAuto) => {
                info!(code = %acc, "Cancel code dialed");
                self.arbiter.cancel_auto();
                self.acknowledge();
            }
            None => warn!(code = %acc, "Invalid dial code"),
        }
    }

    /// Feedback ring, off the decoder's task so the next number's pulses
    /// are counted while it sounds.
    fn acknowledge(&self) {
        let ring = self.ring.clone();
        let feedback = self.timing.feedback;
        tokio::spawn(async move {
            ring.pulse(feedback).await;
        });
    }
}
