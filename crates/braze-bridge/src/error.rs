//! Bridge error types.

use thiserror::Error;

/// Errors raised while starting or running a bridge transport.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Binding the listener socket failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error on an established socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
