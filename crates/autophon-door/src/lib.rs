//! Door actuator for the autophon.
//!
//! Unlocking is a two-step call against the door-lock backend: a form login
//! followed by the open endpoint. The [`Door`] trigger is fire-and-forget;
//! the [`DoorWorker`] performs at most one attempt at a time and publishes
//! [`DoorStats`] after each one.
//!
//! [`Door`]: actuator::Door
//! [`DoorWorker`]: actuator::DoorWorker
//! [`DoorStats`]: actuator::DoorStats

pub mod actuator;
pub mod backend;
pub mod error;

pub use actuator::{Door, DoorOutcome, DoorStats, DoorWorker};
pub use backend::{AnyDoorBackend, DoorBackend, HttpDoorBackend, MockDoorBackend, MockDoorHandle};
pub use error::{DoorError, Result};
