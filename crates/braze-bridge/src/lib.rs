//! # Braze Bridge
//!
//! The duplex JSON protocol bridge of the braze event relay.
//!
//! Two independent transports face external subscribers:
//!
//! - [`ProtocolBridge`] — an authenticated WebSocket server. Events accepted
//!   by the dispatch engine fan out to every open connection as flat JSON
//!   frames; inbound `{action, params}` envelopes are relayed to the host
//!   command surface and answered on the same connection.
//! - [`SyncGateway`] — a half-duplex TCP loop for request/reply only: one
//!   frame in, exactly one frame out, one outstanding request at a time, no
//!   authentication.
//!
//! ## Connection lifecycle
//!
//! ```text
//! Connecting ──accept──▶ Authenticating ──credentials ok──▶ Open ──▶ Closed
//!                              │                             ▲
//!                              └──────── anything else ──────┘ (dropped,
//!                                                               no data)
//! ```
//!
//! Authentication accepts exactly two credential forms: an
//! `Authorization: Bearer <secret>` header, or an `access_token=<secret>`
//! query pair. Per-connection failures never affect other subscribers.

pub mod auth;
pub mod error;
pub mod server;
pub mod sync_gateway;
pub mod wire;

pub use error::BridgeError;
pub use server::{BridgeConfig, BridgeHandle, ProtocolBridge};
pub use sync_gateway::{SyncGateway, SyncGatewayConfig, SyncHandle};
pub use wire::CommandRequest;
