//! Timing and sizing constants for the autophon.
//!
//! All timings are expressed in milliseconds (or seconds where the value is
//! naturally coarse) so they can be turned into a [`Duration`] at the point
//! of use.
//!
//! # Usage
//!
//! ```
//! use autophon_core::constants::*;
//! use std::time::Duration;
//!
//! let on = Duration::from_millis(RING_ON_MS);
//! let off = Duration::from_millis(RING_OFF_MS);
//! assert_eq!(on + off, Duration::from_secs(2));
//! ```
//!
//! # Rotary Dial Timing
//!
//! A rotary dial breaks the line ten times per second while returning to
//! rest, so pulses of one digit are roughly 100ms apart. The gaps below are
//! chosen with that rate in mind:
//!
//! ```text
//! dialer  ─┐                          ┌──  (next digit within 2000ms)
//!          └──────────────────────────┘
//! pulses     ┐ ┐ ┐ ┐
//!            └─┘ └─┘ └─┘ └─┘ ... 200ms of silence closes the digit
//! ```
//!
//! [`Duration`]: std::time::Duration

// ============================================================================
// Ring Controller
// ============================================================================

/// Time the bell line is driven high in one ring cycle.
///
/// # Value: 500 milliseconds
pub const RING_ON_MS: u64 = 500;

/// Time the bell line is held low between two rings.
///
/// # Value: 1500 milliseconds
pub const RING_OFF_MS: u64 = 1500;

/// Feedback pulse given by the request and direct paths after a door open.
///
/// # Value: 250 milliseconds
pub const SHORT_FEEDBACK_MS: u64 = 250;

/// Feedback pulse given by the dial decoder after a valid admin code.
///
/// # Value: 500 milliseconds
pub const DIAL_FEEDBACK_MS: u64 = 500;

// ============================================================================
// Request Arbiter
// ============================================================================

/// Default time a request session rings before giving up.
///
/// # Value: 20 seconds
///
/// # Examples
///
/// ```
/// use autophon_core::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
/// use std::time::Duration;
///
/// let timeout = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);
/// ```
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

/// Interval at which the arbiter re-checks its session while waiting for a pickup.
///
/// # Value: 500 milliseconds
pub const HANGUP_POLL_MS: u64 = 500;

/// Number of finished sessions kept for inspection.
pub const MAX_SESSION_HISTORY: usize = 100;

// ============================================================================
// Dial Decoder
// ============================================================================

/// Silence after the last pulse that closes a digit.
///
/// # Value: 200 milliseconds
pub const PULSE_GAP_MS: u64 = 200;

/// Silence after the last digit that closes a dialed number.
///
/// # Value: 2000 milliseconds
pub const DIGIT_GAP_MS: u64 = 2000;

/// Time allowed between a dialer start and its first pulse.
///
/// A dial session that produces no pulse within this window is abandoned.
///
/// # Value: 10 seconds
pub const DIAL_WATCHDOG_SECS: u64 = 10;

/// Longest digit sequence accepted in one dial session.
pub const MAX_DIAL_DIGITS: usize = 16;

/// Pulses that encode the digit 0.
pub const PULSES_FOR_ZERO: u32 = 10;

// ============================================================================
// Admin Codes
// ============================================================================

/// Default prefix of the "open for N hours" code.
pub const DEFAULT_OPEN_CODE: &str = "42";

/// Default code that cancels automatic mode.
pub const DEFAULT_CANCEL_CODE: &str = "43";

// ============================================================================
// Input Debouncing
// ============================================================================

/// Debounce window of the push-button line.
///
/// # Value: 200 milliseconds
pub const PUSHER_DEBOUNCE_MS: u64 = 200;

/// Debounce window of the hanger (hook switch) line.
///
/// # Value: 200 milliseconds
pub const HANGER_DEBOUNCE_MS: u64 = 200;

/// Debounce window of the dialer-start line.
///
/// # Value: 50 milliseconds
pub const DIALER_DEBOUNCE_MS: u64 = 50;

/// Debounce window of the pulse line.
///
/// Must stay well below the ~100ms pulse period of a rotary dial.
///
/// # Value: 20 milliseconds
pub const PULSE_DEBOUNCE_MS: u64 = 20;

// ============================================================================
// Door Backend
// ============================================================================

/// Default timeout of a single door backend HTTP call.
///
/// # Value: 10 seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_gap_shorter_than_digit_gap() {
        assert!(PULSE_GAP_MS < DIGIT_GAP_MS);
        assert!(PULSE_DEBOUNCE_MS < PULSE_GAP_MS);
    }

    #[test]
    fn test_feedback_shorter_than_ring_cycle() {
        assert!(SHORT_FEEDBACK_MS < RING_ON_MS);
        assert!(DIAL_FEEDBACK_MS <= RING_ON_MS);
    }

    #[test]
    fn test_poll_interval_fits_request_timeout() {
        assert!(HANGUP_POLL_MS < DEFAULT_REQUEST_TIMEOUT_SECS * 1000);
    }
}
