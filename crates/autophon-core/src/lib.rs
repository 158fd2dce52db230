//! Shared building blocks for the autophon door intercom.
//!
//! This crate holds everything the other autophon crates agree on: the
//! common error type, timing constants, the administrative dial codes and
//! the runtime configuration.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{BackendConfig, Config};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
