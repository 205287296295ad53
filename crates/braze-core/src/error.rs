//! Unified error types for the braze core.

use thiserror::Error;

use crate::event::EventKind;

// =============================================================================
// Event construction errors
// =============================================================================

/// Errors raised while building a typed event from raw host fields.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// The host supplied a sub-kind discriminator this kind does not define.
    #[error("unknown sub-kind {code} for {kind} notification")]
    UnknownSubKind {
        /// The primary event category.
        kind: EventKind,
        /// The unrecognized discriminator.
        code: i32,
    },
}

// =============================================================================
// Registry errors
// =============================================================================

/// Errors raised during the one-time handler registration pass.
///
/// Registration errors are configuration errors: they must surface at
/// startup instead of silently masking a handler.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A handler with the same name is already registered for this kind.
    #[error("handler '{name}' already registered for {kind} events")]
    DuplicateName {
        /// The event kind the registration targeted.
        kind: EventKind,
        /// The duplicated handler name.
        name: String,
    },
}

// =============================================================================
// Handler errors
// =============================================================================

/// An error reported by an event handler.
///
/// Handler errors never abort dispatch: the engine logs them with the
/// handler's name and continues with the next handler in line.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    /// Creates a handler error from any displayable value.
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self(message.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Result type returned by event handlers.
pub type HandlerResult = Result<(), HandlerError>;
