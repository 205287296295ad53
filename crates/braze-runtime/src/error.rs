//! Runtime and configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The merged configuration could not be extracted into the schema.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] figment::Error),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised by the runtime orchestrator.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration loading failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A bridge transport failed to start.
    #[error(transparent)]
    Bridge(#[from] braze_bridge::BridgeError),

    /// `start` was called on an already started runtime.
    #[error("runtime already started")]
    AlreadyStarted,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
