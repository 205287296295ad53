//! # Braze Core
//!
//! The dispatch engine of the braze event bridge.
//!
//! This crate turns raw host notifications into typed events and decides the
//! interception verdict that is handed back to the host:
//!
//! - **Event model**: one concrete struct per notification kind, each
//!   embedding a common [`EventEnvelope`] ([`Event`], [`EventKind`])
//! - **Handler registry**: named, priority-ordered handlers per kind
//!   ([`HandlerRegistry`])
//! - **Dispatch engine**: builds the event, runs the handler chain and
//!   returns [`Verdict::Ignored`] or [`Verdict::Intercepted`]
//!   ([`DispatchEngine`])
//! - **Text rendering**: the escaping rules behind the `message` /
//!   `raw_message` split on the wire ([`text`])
//!
//! ## Event Flow
//!
//! ```text
//! ┌──────────┐ raw fields ┌────────────────┐ Event ┌──────────┐
//! │   Host   │───────────▶│ DispatchEngine │──────▶│ Handlers │
//! │ callback │◀───────────│                │       └──────────┘
//! └──────────┘  verdict   └───────┬────────┘
//!                                 │ publishable events
//!                                 ▼
//!                          bridge (mpsc sink)
//! ```
//!
//! Dispatch is synchronous: the host blocks on the verdict, so handlers must
//! stay bounded and hand long-running work off themselves. Events accepted
//! for publication are forwarded through a non-blocking channel to the
//! protocol bridge.
//!
//! ## Example
//!
//! ```rust,ignore
//! use braze_core::{DispatchEngine, EventKind, HandlerRegistry, RawNotification};
//! use std::sync::Arc;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register(EventKind::GroupMessage, "echo", 30_000, |event| {
//!     event.mark_handled();
//!     Ok(())
//! })?;
//!
//! let engine = DispatchEngine::new(Arc::new(registry));
//! let raw = RawNotification::new(1)
//!     .with_message_id(42)
//!     .with_user_id(123)
//!     .with_group_id(456)
//!     .with_text("hi");
//! let verdict = engine.dispatch(EventKind::GroupMessage, raw);
//! assert_eq!(verdict.code(), 1);
//! ```

pub mod dispatch;
pub mod error;
pub mod event;
pub mod registry;
pub mod text;

pub use dispatch::{DispatchEngine, EventSink, Verdict};
pub use error::{BuildError, HandlerError, HandlerResult, RegistryError};
pub use event::{
    AdminChange, Anonymous, DecreaseReason, DiscussMessageEvent, Event, EventEnvelope, EventKind,
    FriendAddedEvent, FriendRequestEvent, GroupAdminChangeEvent, GroupJoinKind,
    GroupJoinRequestEvent, GroupMemberDecreaseEvent, GroupMemberIncreaseEvent, GroupMessageEvent,
    GroupSession, IncreaseMethod, PrivateMessageEvent, PrivateSource, RawNotification,
};
pub use registry::{
    HandlerRegistry, PRIORITY_DEFAULT, PRIORITY_MAX, PRIORITY_MIN, Registration,
};
