//! Time-bounded automatic unlock mode.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Optional expiry of automatic mode.
///
/// While armed and not expired, entry requests open the door without
/// ringing.
///
/// ```
/// use autophon_controller::auto_mode::AutoMode;
/// use chrono::{TimeDelta, Utc};
///
/// let now = Utc::now();
/// let mut auto = AutoMode::default();
/// auto.arm(now + TimeDelta::hours(2));
///
/// assert!(auto.is_armed_at(now));
/// assert!(!auto.is_armed_at(now + TimeDelta::hours(3)));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AutoMode {
    until: Option<DateTime<Utc>>,
}

impl AutoMode {
    /// Arm until `until`, replacing any previous expiry.
    pub fn arm(&mut self, until: DateTime<Utc>) {
        self.until = Some(until);
    }

    /// Disarm. Returns `true` if an unexpired arming was cleared.
    pub fn clear(&mut self, now: DateTime<Utc>) -> bool {
        let was_armed = self.is_armed_at(now);
        self.until = None;
        was_armed
    }

    /// Whether automatic mode applies at `now`.
    pub fn is_armed_at(&self, now: DateTime<Utc>) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    /// Configured expiry, even if already elapsed.
    pub fn until(&self) -> Option<DateTime<Utc>> {
        self.until
    }
}
