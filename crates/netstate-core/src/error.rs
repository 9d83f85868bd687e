//! Error types for netstate core.

use thiserror::Error;

/// The main error type for netstate core operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The connection ID is invalid or has already been disconnected.
    #[error("Invalid or disconnected connection ID")]
    InvalidConnection,
    /// A dispatcher refused to accept a task.
    #[error("Failed to dispatch task: {0}")]
    DispatchFailed(String),
}

/// A specialized Result type for netstate core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
