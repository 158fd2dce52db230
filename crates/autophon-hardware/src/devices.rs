//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn EdgeSource>`
//! is not available. These enums provide concrete type dispatch instead,
//! resolved at compile time.
//!
//! # Examples
//!
//! ```
//! use autophon_hardware::devices::AnyBell;
//! use autophon_hardware::mock::MockBell;
//!
//! let (bell, _handle) = MockBell::new();
//! let any_bell = AnyBell::Mock(bell);
//! ```

use crate::mock::{MockBell, MockInputs};
use crate::traits::{BellOutput, EdgeSource};
use crate::{DeviceInfo, Edge, Result};

/// Enum wrapper for input edge sources.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyEdgeSource {
    /// Mock inputs for development and testing.
    Mock(MockInputs),
}

impl EdgeSource for AnyEdgeSource {
    async fn next_edge(&mut self) -> Result<Edge> {
        match self {
            Self::Mock(device) => device.next_edge().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for bell outputs.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyBell {
    /// Mock bell for development and testing.
    Mock(MockBell),
}

impl BellOutput for AnyBell {
    async fn set_level(&mut self, on: bool) -> Result<()> {
        match self {
            Self::Mock(device) => device.set_level(on).await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}
