/// Download-specific errors
use thiserror::Error;

/// Result type alias using `DownloadError`
pub type Result<T> = std::result::Result<T, DownloadError>;

/// Errors terminating a single download item.
///
/// These never escape the worker; they are logged and folded into the item's
/// `Failed` status.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Remote answered with a non-success status
    #[error("Server error ({status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Transport failure while connecting or streaming the body
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// The cache store rejected the completed payload
    #[error("Store rejected payload: {0}")]
    Store(String),
}
