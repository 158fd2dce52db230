//! Hardware abstraction layer for the autophon.
//!
//! The autophon talks to an old telephone through four input lines and one
//! output line:
//!
//! | Line | Direction | Meaning |
//! |------|-----------|---------|
//! | pusher | in | local push-button |
//! | hanger | in | handset picked up |
//! | dialer | in | rotary dial wound (a digit starts) |
//! | pulse | in | one rotary dial pulse |
//! | bell | out | ring |
//!
//! Input edges come from an [`EdgeSource`] and are turned into momentary
//! [`Signal`]s by the [`InputDispatcher`]. The bell is driven through a
//! [`BellOutput`].
//!
//! # Design Philosophy
//!
//! - **Async-first**: native `async fn` in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: the traits are not object-safe, the [`devices`] module
//!   provides concrete wrappers.
//! - **Thread-safe**: all traits require `Send + Sync` for use with Tokio.
//! - **Fail loudly**: a failing input source ends the dispatcher with an error.
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides controllable inputs and an observable bell
//! for tests and for running the autophon without the telephone attached.
//!
//! [`EdgeSource`]: traits::EdgeSource
//! [`BellOutput`]: traits::BellOutput
//! [`Signal`]: signal::Signal
//! [`InputDispatcher`]: dispatcher::InputDispatcher

pub mod devices;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod signal;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use signal::{Signal, SignalBoard, Subscription};
pub use traits::{BellOutput, EdgeSource};
pub use types::{DeviceInfo, Edge, InputLine};

pub use devices::{AnyBell, AnyEdgeSource};
pub use dispatcher::{Debouncer, InputDispatcher};
