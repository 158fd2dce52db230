//! Common types shared across hardware device implementations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use autophon_core::constants::{
    DIALER_DEBOUNCE_MS, HANGER_DEBOUNCE_MS, PULSE_DEBOUNCE_MS, PUSHER_DEBOUNCE_MS,
};

/// Generic device information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "Mock Bell").
    pub name: String,

    /// Device model identifier.
    pub model: String,
}

impl DeviceInfo {
    /// Create a new DeviceInfo.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Physical input lines of the telephone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputLine {
    /// Local push-button next to the door.
    Pusher,

    /// Hook switch; an edge means the handset was picked up.
    Hanger,

    /// Off-normal contact of the rotary dial (a digit is being dialed).
    Dialer,

    /// Pulse contact of the rotary dial.
    Pulse,
}

impl InputLine {
    /// All input lines, in board order.
    pub const ALL: [InputLine; 4] = [
        InputLine::Pusher,
        InputLine::Hanger,
        InputLine::Dialer,
        InputLine::Pulse,
    ];

    /// Default debounce window for this line.
    pub fn debounce(&self) -> Duration {
        let ms = match self {
            InputLine::Pusher => PUSHER_DEBOUNCE_MS,
            InputLine::Hanger => HANGER_DEBOUNCE_MS,
            InputLine::Dialer => DIALER_DEBOUNCE_MS,
            InputLine::Pulse => PULSE_DEBOUNCE_MS,
        };
        Duration::from_millis(ms)
    }
}

impl fmt::Display for InputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pusher => write!(f, "pusher"),
            Self::Hanger => write!(f, "hanger"),
            Self::Dialer => write!(f, "dialer"),
            Self::Pulse => write!(f, "pulse"),
        }
    }
}

/// A single edge observed on an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Line the edge occurred on.
    pub line: InputLine,

    /// When the edge was observed.
    pub at: Instant,
}

impl Edge {
    /// Create an edge timestamped now.
    pub fn now(line: InputLine) -> Self {
        Self {
            line,
            at: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info() {
        let info = DeviceInfo::new("Mock Bell", "Mock");
        assert_eq!(info.name, "Mock Bell");
        assert_eq!(info.model, "Mock");
    }

    #[test]
    fn test_input_line_display() {
        assert_eq!(InputLine::Pusher.to_string(), "pusher");
        assert_eq!(InputLine::Hanger.to_string(), "hanger");
        assert_eq!(InputLine::Dialer.to_string(), "dialer");
        assert_eq!(InputLine::Pulse.to_string(), "pulse");
    }

    #[test]
    fn test_pulse_debounce_is_shortest() {
        for line in InputLine::ALL {
            assert!(InputLine::Pulse.debounce() <= line.debounce());
        }
    }

    #[test]
    fn test_input_line_serialization() {
        let json = serde_json::to_string(&InputLine::Hanger).unwrap();
        assert_eq!(json, "\"hanger\"");
        let line: InputLine = serde_json::from_str(&json).unwrap();
        assert_eq!(line, InputLine::Hanger);
    }
}
