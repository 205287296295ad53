//! # Braze Host
//!
//! The command surface of the braze bridge.
//!
//! The host process exposes a fixed set of synchronous call-and-return
//! operations — send a message, read account and group metadata. This crate
//! abstracts that surface behind the [`HostApi`] trait and relays named
//! remote actions onto it:
//!
//! - [`HostApi`] — the operations the host implements (out of scope here;
//!   the concrete implementation lives with the host integration layer)
//! - [`CommandAdapter`] — maps `{action, params}` requests from the bridge
//!   onto [`HostApi`] calls and projects host records into transport-safe
//!   JSON shapes
//!
//! ## Permissive request handling
//!
//! Unknown actions and recognized actions with missing parameters both
//! resolve to "no result, no reply" — the adapter returns `None` and the
//! bridge stays silent. Command failures are *values* (`<= 0` send codes,
//! `null` lookups), never protocol errors.

pub mod adapter;
pub mod api;

pub use adapter::{CommandAdapter, FriendSummary, GroupSummary};
pub use api::{BoxedHostApi, FriendInfo, GroupInfo, GroupMemberInfo, HostApi, StrangerInfo};
