//! Error types for the network state module.

use thiserror::Error;

/// Network-state-specific errors.
///
/// Runtime OS failures never surface here; they degrade the model to an
/// unknown or stale state instead. These errors cover construction and
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkStateError {
    /// Installing the OS change watcher failed.
    #[error("Failed to watch network changes: {0}")]
    Watch(String),
    /// Configuration could not be parsed or is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// A prefix length is outside the range of its address family.
    #[error("Invalid prefix length {prefix_len} for {version}")]
    InvalidPrefixLength {
        /// The rejected prefix length.
        prefix_len: u8,
        /// The address family, `ipv4` or `ipv6`.
        version: &'static str,
    },
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for NetworkStateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for NetworkStateError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// A specialized Result type for network state operations.
pub type Result<T> = std::result::Result<T, NetworkStateError>;
