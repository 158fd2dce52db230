//! Hardware device trait definitions.
//!
//! These traits are the contract between the autophon workers and the
//! telephone hardware: a source of input edges and a sink for the bell line.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro. As a consequence they
//! are not object-safe; use the enum wrappers in [`devices`](crate::devices)
//! where a concrete type is needed.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DeviceInfo, Edge};

/// Source of edges on the telephone input lines.
///
/// # Examples
///
/// ```no_run
/// use autophon_hardware::traits::EdgeSource;
/// use autophon_hardware::types::InputLine;
/// use autophon_hardware::error::Result;
///
/// async fn wait_for_pickup<S: EdgeSource>(source: &mut S) -> Result<()> {
///     loop {
///         if source.next_edge().await?.line == InputLine::Hanger {
///             return Ok(());
///         }
///     }
/// }
/// ```
pub trait EdgeSource: Send + Sync {
    /// Wait for the next edge on any line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line driver is gone. The caller should treat
    /// this as fatal.
    async fn next_edge(&mut self) -> Result<Edge>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Digital output driving the bell.
pub trait BellOutput: Send + Sync {
    /// Drive the bell line high (`true`) or low (`false`).
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    async fn set_level(&mut self, on: bool) -> Result<()>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}
