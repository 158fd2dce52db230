//! Door-lock backends.
//!
//! The backend performs one unlock attempt: log in, then call the open
//! endpoint. Only an explicit HTTP 200 from the open call counts as success.

#![allow(async_fn_in_trait)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use autophon_core::BackendConfig;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

use crate::error::{DoorError, Result};

/// Connect timeout of backend calls.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A system that can unlock the door.
pub trait DoorBackend: Send + Sync {
    /// Perform one unlock attempt.
    ///
    /// # Errors
    ///
    /// Returns `DoorError::Transport` if the backend cannot be reached and
    /// `DoorError::Rejected` if it answers with anything but success.
    async fn unlock(&self) -> Result<()>;
}

/// HTTP door-lock backend with a login form and an open endpoint.
#[derive(Debug, Clone)]
pub struct HttpDoorBackend {
    config: BackendConfig,
}

impl HttpDoorBackend {
    /// Create a backend from its connection settings.
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    /// Build a client with its own cookie jar, so every attempt starts a
    /// fresh session.
    fn session(&self) -> Result<Client> {
        Client::builder()
            .cookie_store(true)
            .timeout(self.config.http_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| DoorError::client(e.to_string()))
    }
}

impl DoorBackend for HttpDoorBackend {
    #[instrument(skip(self), fields(open_url = %self.config.open_url))]
    async fn unlock(&self) -> Result<()> {
        let session = self.session()?;

        let login = session
            .post(&self.config.login_url)
            .form(&[
                ("login_username", self.config.username.as_str()),
                ("login_password", self.config.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Door backend login failed");
                DoorError::transport(e.to_string())
            })?;
        // The open call decides; a refused login shows up there.
        debug!(status = %login.status(), "Door backend login");

        let response = session
            .get(&self.config.open_url)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Door backend open call failed");
                DoorError::transport(e.to_string())
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(DoorError::rejected(status.as_u16())),
        }
    }
}

/// Mock backend for tests and simulation.
///
/// # Examples
///
/// ```
/// use autophon_door::backend::{DoorBackend, MockDoorBackend};
///
/// #[tokio::main]
/// async fn main() {
///     let (backend, handle) = MockDoorBackend::new();
///
///     backend.unlock().await.unwrap();
///     handle.set_failing(true);
///     assert!(backend.unlock().await.is_err());
///
///     assert_eq!(handle.calls(), 2);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockDoorBackend {
    state: Arc<MockState>,
    latency: Duration,
}

#[derive(Debug, Default)]
struct MockState {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockDoorBackend {
    /// Create a mock backend that answers immediately.
    pub fn new() -> (Self, MockDoorHandle) {
        Self::with_latency(Duration::ZERO)
    }

    /// Create a mock backend that takes `latency` per attempt.
    pub fn with_latency(latency: Duration) -> (Self, MockDoorHandle) {
        let state = Arc::new(MockState::default());
        let backend = Self {
            state: Arc::clone(&state),
            latency,
        };
        (backend, MockDoorHandle { state })
    }
}

impl DoorBackend for MockDoorBackend {
    async fn unlock(&self) -> Result<()> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(DoorError::rejected(500));
        }
        Ok(())
    }
}

/// Handle for controlling and inspecting a [`MockDoorBackend`].
#[derive(Debug, Clone)]
pub struct MockDoorHandle {
    state: Arc<MockState>,
}

impl MockDoorHandle {
    /// Number of unlock attempts so far.
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Make subsequent attempts fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }
}

/// Enum wrapper for door backend dispatch.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyDoorBackend {
    /// The real HTTP backend.
    Http(HttpDoorBackend),

    /// Mock backend for development and testing.
    Mock(MockDoorBackend),
}

impl DoorBackend for AnyDoorBackend {
    async fn unlock(&self) -> Result<()> {
        match self {
            Self::Http(backend) => backend.unlock().await,
            Self::Mock(backend) => backend.unlock().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend_counts_calls() {
        let (backend, handle) = MockDoorBackend::new();

        backend.unlock().await.unwrap();
        backend.unlock().await.unwrap();

        assert_eq!(handle.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_backend_failing() {
        let (backend, handle) = MockDoorBackend::new();
        handle.set_failing(true);

        let result = backend.unlock().await;
        assert!(matches!(result, Err(DoorError::Rejected { status: 500 })));

        handle.set_failing(false);
        assert!(backend.unlock().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_backend_latency() {
        let (backend, _handle) = MockDoorBackend::with_latency(Duration::from_secs(2));
        let start = tokio::time::Instant::now();

        backend.unlock().await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_any_backend_dispatch() {
        let (backend, handle) = MockDoorBackend::new();
        let backend = AnyDoorBackend::Mock(backend);

        backend.unlock().await.unwrap();
        assert_eq!(handle.calls(), 1);
    }
}
