/// Boundary error types
use thiserror::Error;

/// Errors from the remote synthesis service
#[derive(Error, Debug)]
pub enum TtsError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("Synthesis request failed: {0}")]
    Request(String),

    /// Service answered with a non-success status
    #[error("Synthesis service error ({status}): {message}")]
    Service {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Response did not contain a usable audio URL
    #[error("Malformed synthesis response: {0}")]
    MalformedResponse(String),
}

/// Errors from the history recorder
///
/// Callers treat recording as fire-and-forget; this type exists so
/// implementations can report what went wrong to the log.
#[derive(Error, Debug)]
#[error("History recording failed: {0}")]
pub struct HistoryError(pub String);
