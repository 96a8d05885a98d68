//! Error types shared by the fetching, normalization and rendering layers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport failure or a non-2xx response. Aborts the whole traversal.
    #[error("API request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    /// The response body is not JSON or lacks the expected `data` array.
    #[error("Malformed API response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("Unparsable timestamp {value:?}: {reason}")]
    TimeParse { value: String, reason: String },

    /// Out-of-order use of the RSS writer.
    #[error("Invalid RSS writer state: cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FeedError>;
