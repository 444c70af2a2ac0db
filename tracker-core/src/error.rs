//! Error types for the token engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors
///
/// The first three variants are surfaced to callers verbatim; `Internal` is
/// logged with context and returned as an opaque message at the API boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown user, notification, or transaction id
    #[error("Not found: {0}")]
    NotFound(String),

    /// External breach provider unreachable or timed out
    #[error("Breach provider unavailable: {0}")]
    GatewayUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("JSON error: {}", err))
    }
}

impl Error {
    /// True for errors whose message may be shown to the caller unchanged
    pub fn is_caller_visible(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_) | Error::NotFound(_) | Error::GatewayUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_visibility() {
        assert!(Error::InvalidArgument("amount".into()).is_caller_visible());
        assert!(Error::NotFound("user".into()).is_caller_visible());
        assert!(Error::GatewayUnavailable("timeout".into()).is_caller_visible());
        assert!(!Error::Internal("poisoned".into()).is_caller_visible());
    }
}
