//! Mock input lines for testing and simulation.
//!
//! Edges are injected through a [`MockInputsHandle`], the way a GPIO
//! interrupt handler would deliver them.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::{
    HardwareError, Result,
    traits::EdgeSource,
    types::{DeviceInfo, Edge, InputLine},
};

/// Time between two pulses of one digit (a dial runs at ~10 pulses/s).
pub const MOCK_PULSE_INTERVAL: Duration = Duration::from_millis(60);

/// Time between the last pulse of a digit and the next dialer start.
pub const MOCK_DIGIT_INTERVAL: Duration = Duration::from_millis(800);

/// Mock edge source.
///
/// # Examples
///
/// ```
/// use autophon_hardware::mock::MockInputs;
/// use autophon_hardware::traits::EdgeSource;
/// use autophon_hardware::types::InputLine;
///
/// #[tokio::main]
/// async fn main() -> autophon_hardware::Result<()> {
///     let (mut inputs, handle) = MockInputs::new();
///
///     handle.press(InputLine::Pusher).await?;
///
///     let edge = inputs.next_edge().await?;
///     assert_eq!(edge.line, InputLine::Pusher);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockInputs {
    /// Channel receiver for simulated edges
    edge_rx: mpsc::Receiver<Edge>,

    /// Device name
    name: String,
}

impl MockInputs {
    /// Create mock inputs with the default name.
    pub fn new() -> (Self, MockInputsHandle) {
        Self::with_name("Mock Inputs".to_string())
    }

    /// Create mock inputs with a custom name.
    pub fn with_name(name: String) -> (Self, MockInputsHandle) {
        let (edge_tx, edge_rx) = mpsc::channel(64);

        let inputs = Self {
            edge_rx,
            name: name.clone(),
        };

        let handle = MockInputsHandle { edge_tx, name };

        (inputs, handle)
    }
}

impl EdgeSource for MockInputs {
    async fn next_edge(&mut self) -> Result<Edge> {
        self.edge_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("Input edge channel closed"))
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Inputs v1.0"))
    }
}

/// Handle for injecting edges into [`MockInputs`].
///
/// Can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockInputsHandle {
    /// Channel sender for simulated edges
    edge_tx: mpsc::Sender<Edge>,

    /// Device name
    name: String,
}

impl MockInputsHandle {
    /// Emit one edge on `line`, timestamped now.
    ///
    /// # Errors
    ///
    /// Returns an error if the inputs have been dropped.
    pub async fn press(&self, line: InputLine) -> Result<()> {
        self.edge_tx
            .send(Edge::now(line))
            .await
            .map_err(|_| HardwareError::disconnected("Input edge channel closed"))
    }

    /// Dial one digit: a dialer start followed by the digit's pulses.
    ///
    /// Digit 0 produces ten pulses.
    ///
    /// # Errors
    ///
    /// Returns an error if the inputs have been dropped.
    pub async fn dial_digit(&self, digit: u8) -> Result<()> {
        let pulses = match digit % 10 {
            0 => 10,
            d => d,
        };
        self.press(InputLine::Dialer).await?;
        for _ in 0..pulses {
            tokio::time::sleep(MOCK_PULSE_INTERVAL).await;
            self.press(InputLine::Pulse).await?;
        }
        Ok(())
    }

    /// Dial a number, pausing [`MOCK_DIGIT_INTERVAL`] between digits.
    ///
    /// # Errors
    ///
    /// Returns an error if the inputs have been dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use autophon_hardware::mock::MockInputs;
    ///
    /// #[tokio::main]
    /// async fn main() -> autophon_hardware::Result<()> {
    ///     let (_inputs, handle) = MockInputs::new();
    ///     handle.dial(&[4, 2, 3]).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn dial(&self, digits: &[u8]) -> Result<()> {
        for (i, digit) in digits.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(MOCK_DIGIT_INTERVAL).await;
            }
            self.dial_digit(*digit).await?;
        }
        Ok(())
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
