//! Directory client error types.

use thiserror::Error;

/// Error that can occur while talking to the directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The directory could not be reached or the transport failed mid-request.
    ///
    /// Surfaced to the caller as a communication error; the client performs
    /// no internal retries.
    #[error("directory unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The directory did not answer within the configured timeout.
    #[error("directory timeout after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Bind was rejected for the configured credentials.
    #[error("directory bind failed for {bind_dn}")]
    BindFailed { bind_dn: String },

    /// A search pattern could not be translated into a directory query.
    #[error("invalid search pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The client configuration is unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl DirectoryError {
    /// Whether the failure is a temporary condition a higher layer may retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DirectoryError::Unavailable { .. } | DirectoryError::Timeout { .. }
        )
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        DirectoryError::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unavailable error with the underlying transport error.
    pub fn unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        DirectoryError::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        DirectoryError::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        DirectoryError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
