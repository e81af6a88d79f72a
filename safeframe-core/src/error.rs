//! Error types for safe-frame operations.

use thiserror::Error;

/// Result type for safe-frame operations.
pub type SafeFrameResult<T> = Result<T, SafeFrameError>;

/// Errors that can occur in safe-frame operations.
///
/// The engine itself never fails its read, update, or registration calls;
/// errors exist only at validation boundaries where untrusted numbers enter
/// the system.
#[derive(Debug, Error)]
pub enum SafeFrameError {
    /// A viewport measurement had a non-positive or non-finite dimension.
    #[error("Invalid viewport measurement: {width}x{height}")]
    InvalidViewport {
        /// The rejected width.
        width: f64,
        /// The rejected height.
        height: f64,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
