//! Mock device implementations for testing and simulation.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without the telephone hardware attached.

pub mod bell;
pub mod inputs;

// Re-export commonly used types
pub use bell::{MockBell, MockBellHandle};
pub use inputs::{MockInputs, MockInputsHandle};
