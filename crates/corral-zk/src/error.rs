//! Stats client error types.

use thiserror::Error;

/// Error from a stats-port exchange.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Connecting, sending, or receiving failed.
    #[error("stats socket error: {0}")]
    Io(#[from] std::io::Error),

    /// The server did not answer within the configured timeout.
    #[error("stats request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// A line did not match any known layout.
    ///
    /// Raised only for lines a caller parses directly; inside a full reply a
    /// malformed line is skipped and parsing continues.
    #[error("malformed stats line: {line}")]
    Parse { line: String },
}

/// Result type for stats operations.
pub type StatsResult<T> = Result<T, StatsError>;
