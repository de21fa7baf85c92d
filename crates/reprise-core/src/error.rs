//! Error types for Reprise Core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Manifest readiness errors
    #[error("Manifest not found (status {status})")]
    ManifestNotFound { status: u16 },

    #[error("Failed to check manifest: {0}")]
    ManifestUnreachable(String),

    #[error("Manifest still processing after {attempts} checks")]
    PollAttemptsExhausted { attempts: u32 },

    #[error("Failed to parse manifest: {0}")]
    ManifestParse(String),

    // Subtitle errors
    #[error("Invalid subtitle descriptor: {0}")]
    InvalidDescriptor(String),

    // Session errors
    #[error("Invalid readiness transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid media path: {0}")]
    InvalidMediaPath(String),

    // Network errors
    #[cfg(feature = "native")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if retrying the same request later may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::ManifestUnreachable(_) | Error::PollAttemptsExhausted { .. } => true,
            #[cfg(feature = "native")]
            Error::Network(_) => true,
            _ => false,
        }
    }

    /// Returns a stable error code for status reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::ManifestNotFound { .. } => "MANIFEST_NOT_FOUND",
            Error::ManifestUnreachable(_) => "MANIFEST_UNREACHABLE",
            Error::PollAttemptsExhausted { .. } => "POLL_EXHAUSTED",
            Error::ManifestParse(_) => "MANIFEST_PARSE",
            Error::InvalidDescriptor(_) => "INVALID_DESCRIPTOR",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::InvalidMediaPath(_) => "INVALID_MEDIA_PATH",
            #[cfg(feature = "native")]
            Error::Network(_) => "NETWORK",
            Error::Url(_) => "URL",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Internal(_) => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable() {
        assert!(Error::ManifestUnreachable("refused".into()).is_recoverable());
        assert!(!Error::ManifestNotFound { status: 404 }.is_recoverable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::ManifestNotFound { status: 500 }.error_code(), "MANIFEST_NOT_FOUND");
        assert_eq!(
            Error::InvalidDescriptor("x".into()).error_code(),
            "INVALID_DESCRIPTOR"
        );
    }
}
