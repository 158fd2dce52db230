//! Input edge dispatcher.
//!
//! The dispatcher owns the edge source, debounces each line and raises the
//! matching [`Signal`](crate::signal::Signal) on a [`SignalBoard`].
//!
//! ```text
//! ┌─────────────┐      ┌────────────┐      ┌─────────────┐
//! │ EdgeSource  │─────►│ Debouncer  │─────►│ SignalBoard │──► workers
//! └─────────────┘      └────────────┘      └─────────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use autophon_hardware::devices::AnyEdgeSource;
//! use autophon_hardware::dispatcher::InputDispatcher;
//! use autophon_hardware::mock::MockInputs;
//! use autophon_hardware::signal::SignalBoard;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> autophon_hardware::Result<()> {
//!     let (inputs, _handle) = MockInputs::new();
//!     let board = SignalBoard::new();
//!     let dispatcher = InputDispatcher::new(AnyEdgeSource::Mock(inputs), board.clone());
//!
//!     dispatcher.run(CancellationToken::new()).await
//! }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::devices::AnyEdgeSource;
use crate::signal::SignalBoard;
use crate::traits::EdgeSource;
use crate::types::{Edge, InputLine};
use crate::Result;

/// Per-line debounce filter.
///
/// An edge is accepted when it is at least the line's window after the
/// previously accepted edge on the same line.
#[derive(Debug, Clone)]
pub struct Debouncer {
    windows: HashMap<InputLine, Duration>,
    last_accepted: HashMap<InputLine, Instant>,
}

impl Debouncer {
    /// Create a debouncer with each line's default window.
    pub fn new() -> Self {
        Self {
            windows: InputLine::ALL
                .iter()
                .map(|line| (*line, line.debounce()))
                .collect(),
            last_accepted: HashMap::new(),
        }
    }

    /// Override the window of one line.
    pub fn with_window(mut self, line: InputLine, window: Duration) -> Self {
        self.windows.insert(line, window);
        self
    }

    /// Window currently applied to `line`.
    pub fn window(&self, line: InputLine) -> Duration {
        self.windows.get(&line).copied().unwrap_or_default()
    }

    /// Decide whether `edge` is a real transition.
    pub fn accept(&mut self, edge: &Edge) -> bool {
        let window = self.window(edge.line);
        if let Some(last) = self.last_accepted.get(&edge.line)
            && edge.at.saturating_duration_since(*last) < window
        {
            return false;
        }
        self.last_accepted.insert(edge.line, edge.at);
        true
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes debounced edges from the hardware to the signal board.
#[derive(Debug)]
pub struct InputDispatcher {
    source: AnyEdgeSource,
    board: SignalBoard,
    debouncer: Debouncer,
}

impl InputDispatcher {
    /// Create a dispatcher with default debounce windows.
    pub fn new(source: AnyEdgeSource, board: SignalBoard) -> Self {
        Self::with_debouncer(source, board, Debouncer::new())
    }

    /// Create a dispatcher with a custom debouncer.
    pub fn with_debouncer(source: AnyEdgeSource, board: SignalBoard, debouncer: Debouncer) -> Self {
        Self {
            source,
            board,
            debouncer,
        }
    }

    /// Pump edges until cancelled.
    ///
    /// # Errors
    ///
    /// Returns the source's error when the line driver fails. The autophon
    /// cannot work without its inputs, so callers treat this as fatal.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        let info = self.source.get_info().await?;
        debug!("Input dispatcher started on {}", info.name);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Input dispatcher stopped");
                    return Ok(());
                }
                edge = self.source.next_edge() => {
                    match edge {
                        Ok(edge) => self.dispatch(edge),
                        Err(e) => {
                            error!("Input source failed: {}", e);
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    fn dispatch(&mut self, edge: Edge) {
        if self.debouncer.accept(&edge) {
            trace!(line = %edge.line, "Edge");
            self.board.get(edge.line).raise();
        } else {
            trace!(line = %edge.line, "Edge debounced");
        }
    }
}
