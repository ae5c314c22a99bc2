//! Identity store error types.

use thiserror::Error;

/// Error from an identity store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A user or group named in the call does not exist.
    #[error("{entity} not found: {name}")]
    NotFound { entity: &'static str, name: String },

    /// Create collided with an existing entity of the same name.
    #[error("{entity} already exists: {name}")]
    AlreadyExists { entity: &'static str, name: String },

    /// Backend failure (connection, transaction, serialization).
    #[error("store backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    pub fn user_not_found(name: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: "user",
            name: name.into(),
        }
    }

    pub fn group_not_found(name: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: "group",
            name: name.into(),
        }
    }

    pub fn user_exists(name: impl Into<String>) -> Self {
        StoreError::AlreadyExists {
            entity: "user",
            name: name.into(),
        }
    }

    pub fn group_exists(name: impl Into<String>) -> Self {
        StoreError::AlreadyExists {
            entity: "group",
            name: name.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend {
            message: message.into(),
            source: None,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
