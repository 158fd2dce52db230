//! Error types for door backend operations.

/// Result type alias for door operations.
pub type Result<T> = std::result::Result<T, DoorError>;

/// Errors that can occur while unlocking the door.
#[derive(Debug, thiserror::Error)]
pub enum DoorError {
    /// The backend could not be reached or the call failed midway.
    #[error("Door backend unreachable: {message}")]
    Transport { message: String },

    /// The backend answered, but not with a success status.
    #[error("Door backend rejected the request with status {status}")]
    Rejected { status: u16 },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {message}")]
    Client { message: String },
}

impl DoorError {
    /// Create a new transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new rejected error.
    pub fn rejected(status: u16) -> Self {
        Self::Rejected { status }
    }

    /// Create a new client error.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DoorError::transport("connection refused").to_string(),
            "Door backend unreachable: connection refused"
        );
        assert_eq!(
            DoorError::rejected(403).to_string(),
            "Door backend rejected the request with status 403"
        );
        assert_eq!(
            DoorError::client("no TLS backend").to_string(),
            "HTTP client error: no TLS backend"
        );
    }
}
