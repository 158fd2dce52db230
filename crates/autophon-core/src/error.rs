use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Dial errors
    #[error("Invalid dial code: {0}")]
    InvalidDialCode(String),

    #[error("Invalid pulse count: {0} (expected 1-10)")]
    InvalidPulseCount(u32),

    // Session errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::InvalidPulseCount(11).to_string(),
            "Invalid pulse count: 11 (expected 1-10)"
        );
        assert_eq!(
            Error::MissingConfig("EASYDOOR_LOGINURL".to_string()).to_string(),
            "Missing configuration key: EASYDOOR_LOGINURL"
        );
        assert_eq!(
            Error::InvalidStateTransition {
                from: "Idle".to_string(),
                to: "Opened".to_string()
            }
            .to_string(),
            "Invalid state transition from Idle to Opened"
        );
    }
}
