//! # Braze Runtime
//!
//! Orchestration layer of the braze bridge.
//!
//! This crate owns everything around the core: configuration loading,
//! logging setup, the host callback boundary and the wiring between the
//! dispatch engine and the protocol transports.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use braze_core::{EventKind, HandlerRegistry};
//! use braze_runtime::{BrazeConfig, BridgeRuntime, config};
//! use std::sync::Arc;
//!
//! // One-time registration pass.
//! let mut registry = HandlerRegistry::new();
//! registry.register(EventKind::GroupMessage, "echo", 30_000, |event| {
//!     event.mark_handled();
//!     Ok(())
//! })?;
//!
//! let config = config::load()?;
//! let mut runtime = BridgeRuntime::new(config, host_api, registry);
//! runtime.start().await?;
//!
//! // The gateway is what the host integration layer calls into.
//! let gateway = runtime.callback_gateway();
//! runtime.run_until_shutdown().await?;
//! ```
//!
//! All state is explicitly constructed and passed down — the registry is
//! frozen into the engine, the engine feeds the bridge through a channel,
//! and the [`CallbackGateway`] is a cheap clone over the shared engine. No
//! ambient globals.

pub mod boundary;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use boundary::CallbackGateway;
pub use config::{BrazeConfig, BridgeSection, LogFormat, LoggingSection, SyncSection};
pub use error::{ConfigError, RuntimeError};
pub use runtime::BridgeRuntime;
