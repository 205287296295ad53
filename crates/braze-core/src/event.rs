//! Typed event model for host notifications.
//!
//! The host reports every notification as a kind plus an integer sub-kind
//! discriminator and a handful of positional fields. This module turns that
//! into a closed sum type:
//!
//! ```text
//! Event
//! ├── PrivateMessage { source, message_id, text, font }
//! ├── GroupMessage   { session, group_id, message_id, anonymous, text, font }
//! ├── DiscussMessage { discuss_id, message_id, text, font }
//! ├── GroupAdminChange    { change, group_id, timestamp }
//! ├── GroupMemberDecrease { reason, group_id, target_id, timestamp }
//! ├── GroupMemberIncrease { method, group_id, target_id, timestamp }
//! ├── FriendAdded    { timestamp }
//! ├── FriendRequest  { verify_text, flag, timestamp }
//! └── GroupJoinRequest { kind, group_id, verify_text, flag, timestamp }
//! ```
//!
//! Every variant embeds an [`EventEnvelope`] by value carrying the origin
//! account and the `handled` flag. Sub-kind discriminators are matched
//! exhaustively at construction time; an unrecognized code is a
//! [`BuildError::UnknownSubKind`], never a partially-filled event.

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

// ============================================================================
// Event kinds
// ============================================================================

/// Primary categories of host notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A message delivered over a private channel.
    PrivateMessage,
    /// A message posted in a group.
    GroupMessage,
    /// A message posted in a discuss session.
    DiscussMessage,
    /// A group member was granted or stripped of admin rights.
    GroupAdminChange,
    /// A member left or was removed from a group.
    GroupMemberDecrease,
    /// A member joined a group.
    GroupMemberIncrease,
    /// An account became a friend of the bot.
    FriendAdded,
    /// An account asked to become a friend of the bot.
    FriendRequest,
    /// An account asked to join a group, or the bot was invited to one.
    GroupJoinRequest,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PrivateMessage => "private-message",
            Self::GroupMessage => "group-message",
            Self::DiscussMessage => "discuss-message",
            Self::GroupAdminChange => "group-admin-change",
            Self::GroupMemberDecrease => "group-member-decrease",
            Self::GroupMemberIncrease => "group-member-increase",
            Self::FriendAdded => "friend-added",
            Self::FriendRequest => "friend-request",
            Self::GroupJoinRequest => "group-join-request",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Sub-kind discriminators
// ============================================================================

/// Origin channel of a private message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivateSource {
    /// Direct message (code 1).
    Direct,
    /// Temp session proxied through a group (code 2).
    GroupTemp,
    /// Temp session proxied through a discuss session (code 3).
    DiscussTemp,
    /// Friend message under the alternate code the host also emits (code 11).
    Friend,
}

impl PrivateSource {
    /// Maps the host discriminator onto a source, `None` if unrecognized.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Direct),
            2 => Some(Self::GroupTemp),
            3 => Some(Self::DiscussTemp),
            11 => Some(Self::Friend),
            _ => None,
        }
    }

    /// The host discriminator this source was built from.
    pub fn code(self) -> i32 {
        match self {
            Self::Direct => 1,
            Self::GroupTemp => 2,
            Self::DiscussTemp => 3,
            Self::Friend => 11,
        }
    }
}

/// Session flavor of a group message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSession {
    /// Regular group message (code 1).
    Normal,
    /// Group-scoped temp session (code 2).
    Temp,
}

impl GroupSession {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Normal),
            2 => Some(Self::Temp),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Normal => 1,
            Self::Temp => 2,
        }
    }
}

/// Direction of a group admin change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminChange {
    /// Admin rights were revoked (code 1).
    Revoked,
    /// Admin rights were granted (code 2).
    Granted,
}

impl AdminChange {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Revoked),
            2 => Some(Self::Granted),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Revoked => 1,
            Self::Granted => 2,
        }
    }
}

/// Why a member left a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecreaseReason {
    /// The member left on their own (code 1).
    Leave,
    /// The member was kicked by an operator (code 2).
    Kick,
}

impl DecreaseReason {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Leave),
            2 => Some(Self::Kick),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Leave => 1,
            Self::Kick => 2,
        }
    }
}

/// How a member entered a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncreaseMethod {
    /// An operator approved the join request (code 1).
    Approved,
    /// An operator invited the member (code 2).
    Invited,
}

impl IncreaseMethod {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Approved),
            2 => Some(Self::Invited),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Approved => 1,
            Self::Invited => 2,
        }
    }
}

/// Flavor of a group join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupJoinKind {
    /// An account applied to join the group (code 1).
    Application,
    /// The bot itself was invited into the group (code 2).
    Invitation,
}

impl GroupJoinKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Application),
            2 => Some(Self::Invitation),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Application => 1,
            Self::Invitation => 2,
        }
    }
}

// ============================================================================
// Shared records
// ============================================================================

/// The fields every event carries, embedded by value in each variant.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    /// The account the notification concerns: the sender for messages and
    /// requests, the operated account for admin changes, the operator for
    /// membership changes.
    pub origin_id: i64,
    /// Whether a handler has fully processed the event.
    handled: bool,
}

impl EventEnvelope {
    /// Creates an envelope for the given origin account. `handled` starts false.
    pub fn new(origin_id: i64) -> Self {
        Self {
            origin_id,
            handled: false,
        }
    }

    /// Returns whether a handler has claimed this event.
    pub fn handled(&self) -> bool {
        self.handled
    }

    /// Marks the event as handled. The flag only ever moves false → true.
    pub fn mark_handled(&mut self) {
        self.handled = true;
    }
}

/// Identity of an anonymous group-message sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anonymous {
    /// Per-group anonymous identity number.
    pub id: i64,
    /// Display alias.
    pub name: String,
    /// Opaque token the host needs to act on this sender (e.g. to mute).
    pub token: String,
}

// ============================================================================
// Raw notification fields
// ============================================================================

/// The positional fields of one host callback invocation.
///
/// The host boundary fills in whichever fields its callback carries; kinds
/// read the fields they define and ignore the rest. Only the sub-kind
/// discriminator is validated — the host always supplies its positional
/// parameters, so absent numeric fields default to zero.
#[derive(Debug, Clone, Default)]
pub struct RawNotification {
    /// The host's integer sub-kind discriminator.
    pub sub_kind: i32,
    /// Message id, where the callback carries one.
    pub message_id: Option<i32>,
    /// Notification time reported by the host (notices and requests).
    pub timestamp: Option<i64>,
    /// Originating account.
    pub user_id: Option<i64>,
    /// Group the notification belongs to.
    pub group_id: Option<i64>,
    /// Discuss session the notification belongs to.
    pub discuss_id: Option<i64>,
    /// Account being operated on (membership and admin changes).
    pub target_id: Option<i64>,
    /// Textual payload: message body or request verify text.
    pub text: Option<String>,
    /// Response flag for request notifications.
    pub flag: Option<String>,
    /// Anonymous sender identity, already decoded by the host layer.
    pub anonymous: Option<Anonymous>,
    /// Font handle reported with messages.
    pub font: Option<i32>,
}

impl RawNotification {
    /// Creates a raw notification with the given sub-kind discriminator.
    pub fn new(sub_kind: i32) -> Self {
        Self {
            sub_kind,
            ..Self::default()
        }
    }

    pub fn with_message_id(mut self, message_id: i32) -> Self {
        self.message_id = Some(message_id);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_group_id(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_discuss_id(mut self, discuss_id: i64) -> Self {
        self.discuss_id = Some(discuss_id);
        self
    }

    pub fn with_target_id(mut self, target_id: i64) -> Self {
        self.target_id = Some(target_id);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    pub fn with_anonymous(mut self, anonymous: Anonymous) -> Self {
        self.anonymous = Some(anonymous);
        self
    }

    pub fn with_font(mut self, font: i32) -> Self {
        self.font = Some(font);
        self
    }

    fn take_text(&mut self) -> String {
        self.text.take().unwrap_or_default()
    }

    fn take_flag(&mut self) -> String {
        self.flag.take().unwrap_or_default()
    }
}

// ============================================================================
// Concrete events
// ============================================================================

/// A message delivered over a private channel.
#[derive(Debug, Clone)]
pub struct PrivateMessageEvent {
    pub envelope: EventEnvelope,
    pub source: PrivateSource,
    pub message_id: i32,
    pub text: String,
    pub font: i32,
}

/// A message posted in a group.
#[derive(Debug, Clone)]
pub struct GroupMessageEvent {
    pub envelope: EventEnvelope,
    pub session: GroupSession,
    pub group_id: i64,
    pub message_id: i32,
    /// Present when the sender posted anonymously.
    pub anonymous: Option<Anonymous>,
    pub text: String,
    pub font: i32,
}

/// A message posted in a discuss session.
#[derive(Debug, Clone)]
pub struct DiscussMessageEvent {
    pub envelope: EventEnvelope,
    pub discuss_id: i64,
    pub message_id: i32,
    pub text: String,
    pub font: i32,
}

/// A group member was granted or stripped of admin rights.
///
/// The envelope origin is the operated account.
#[derive(Debug, Clone)]
pub struct GroupAdminChangeEvent {
    pub envelope: EventEnvelope,
    pub change: AdminChange,
    pub group_id: i64,
    pub timestamp: i64,
}

/// A member left or was removed from a group.
///
/// The envelope origin is the operator; `target_id` is the departed member.
#[derive(Debug, Clone)]
pub struct GroupMemberDecreaseEvent {
    pub envelope: EventEnvelope,
    pub reason: DecreaseReason,
    pub group_id: i64,
    pub target_id: i64,
    pub timestamp: i64,
}

/// A member joined a group.
///
/// The envelope origin is the operator; `target_id` is the new member.
#[derive(Debug, Clone)]
pub struct GroupMemberIncreaseEvent {
    pub envelope: EventEnvelope,
    pub method: IncreaseMethod,
    pub group_id: i64,
    pub target_id: i64,
    pub timestamp: i64,
}

/// An account became a friend of the bot.
#[derive(Debug, Clone)]
pub struct FriendAddedEvent {
    pub envelope: EventEnvelope,
    pub timestamp: i64,
}

/// An account asked to become a friend of the bot.
#[derive(Debug, Clone)]
pub struct FriendRequestEvent {
    pub envelope: EventEnvelope,
    pub verify_text: String,
    /// Opaque flag the host needs to answer the request.
    pub flag: String,
    pub timestamp: i64,
}

/// An account asked to join a group, or the bot was invited into one.
#[derive(Debug, Clone)]
pub struct GroupJoinRequestEvent {
    pub envelope: EventEnvelope,
    pub kind: GroupJoinKind,
    pub group_id: i64,
    pub verify_text: String,
    /// Opaque flag the host needs to answer the request.
    pub flag: String,
    pub timestamp: i64,
}

// ============================================================================
// Event sum type
// ============================================================================

/// A typed host notification.
///
/// Created per callback invocation, lives only for the duration of dispatch
/// plus an optional publish to the bridge. Never persisted by this core.
#[derive(Debug, Clone)]
pub enum Event {
    PrivateMessage(PrivateMessageEvent),
    GroupMessage(GroupMessageEvent),
    DiscussMessage(DiscussMessageEvent),
    GroupAdminChange(GroupAdminChangeEvent),
    GroupMemberDecrease(GroupMemberDecreaseEvent),
    GroupMemberIncrease(GroupMemberIncreaseEvent),
    FriendAdded(FriendAddedEvent),
    FriendRequest(FriendRequestEvent),
    GroupJoinRequest(GroupJoinRequestEvent),
}

impl Event {
    /// Builds the typed event for `kind` from the raw callback fields.
    ///
    /// Sub-kind discriminators are matched exhaustively; an unrecognized
    /// code yields [`BuildError::UnknownSubKind`].
    pub fn build(kind: EventKind, mut raw: RawNotification) -> Result<Self, BuildError> {
        let code = raw.sub_kind;
        let unknown = || BuildError::UnknownSubKind { kind, code };
        let origin = raw.user_id.unwrap_or_default();

        let event = match kind {
            EventKind::PrivateMessage => Self::PrivateMessage(PrivateMessageEvent {
                envelope: EventEnvelope::new(origin),
                source: PrivateSource::from_code(code).ok_or_else(unknown)?,
                message_id: raw.message_id.unwrap_or_default(),
                text: raw.take_text(),
                font: raw.font.unwrap_or_default(),
            }),
            EventKind::GroupMessage => Self::GroupMessage(GroupMessageEvent {
                envelope: EventEnvelope::new(origin),
                session: GroupSession::from_code(code).ok_or_else(unknown)?,
                group_id: raw.group_id.unwrap_or_default(),
                message_id: raw.message_id.unwrap_or_default(),
                anonymous: raw.anonymous.take(),
                text: raw.take_text(),
                font: raw.font.unwrap_or_default(),
            }),
            EventKind::DiscussMessage => {
                if code != 1 {
                    return Err(unknown());
                }
                Self::DiscussMessage(DiscussMessageEvent {
                    envelope: EventEnvelope::new(origin),
                    discuss_id: raw.discuss_id.unwrap_or_default(),
                    message_id: raw.message_id.unwrap_or_default(),
                    text: raw.take_text(),
                    font: raw.font.unwrap_or_default(),
                })
            }
            EventKind::GroupAdminChange => Self::GroupAdminChange(GroupAdminChangeEvent {
                envelope: EventEnvelope::new(raw.target_id.unwrap_or_default()),
                change: AdminChange::from_code(code).ok_or_else(unknown)?,
                group_id: raw.group_id.unwrap_or_default(),
                timestamp: raw.timestamp.unwrap_or_default(),
            }),
            EventKind::GroupMemberDecrease => {
                Self::GroupMemberDecrease(GroupMemberDecreaseEvent {
                    envelope: EventEnvelope::new(origin),
                    reason: DecreaseReason::from_code(code).ok_or_else(unknown)?,
                    group_id: raw.group_id.unwrap_or_default(),
                    target_id: raw.target_id.unwrap_or_default(),
                    timestamp: raw.timestamp.unwrap_or_default(),
                })
            }
            EventKind::GroupMemberIncrease => {
                Self::GroupMemberIncrease(GroupMemberIncreaseEvent {
                    envelope: EventEnvelope::new(origin),
                    method: IncreaseMethod::from_code(code).ok_or_else(unknown)?,
                    group_id: raw.group_id.unwrap_or_default(),
                    target_id: raw.target_id.unwrap_or_default(),
                    timestamp: raw.timestamp.unwrap_or_default(),
                })
            }
            EventKind::FriendAdded => {
                if code != 1 {
                    return Err(unknown());
                }
                Self::FriendAdded(FriendAddedEvent {
                    envelope: EventEnvelope::new(origin),
                    timestamp: raw.timestamp.unwrap_or_default(),
                })
            }
            EventKind::FriendRequest => {
                if code != 1 {
                    return Err(unknown());
                }
                Self::FriendRequest(FriendRequestEvent {
                    envelope: EventEnvelope::new(origin),
                    verify_text: raw.take_text(),
                    flag: raw.take_flag(),
                    timestamp: raw.timestamp.unwrap_or_default(),
                })
            }
            EventKind::GroupJoinRequest => Self::GroupJoinRequest(GroupJoinRequestEvent {
                envelope: EventEnvelope::new(origin),
                kind: GroupJoinKind::from_code(code).ok_or_else(unknown)?,
                group_id: raw.group_id.unwrap_or_default(),
                verify_text: raw.take_text(),
                flag: raw.take_flag(),
                timestamp: raw.timestamp.unwrap_or_default(),
            }),
        };

        Ok(event)
    }

    /// The primary category of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PrivateMessage(_) => EventKind::PrivateMessage,
            Self::GroupMessage(_) => EventKind::GroupMessage,
            Self::DiscussMessage(_) => EventKind::DiscussMessage,
            Self::GroupAdminChange(_) => EventKind::GroupAdminChange,
            Self::GroupMemberDecrease(_) => EventKind::GroupMemberDecrease,
            Self::GroupMemberIncrease(_) => EventKind::GroupMemberIncrease,
            Self::FriendAdded(_) => EventKind::FriendAdded,
            Self::FriendRequest(_) => EventKind::FriendRequest,
            Self::GroupJoinRequest(_) => EventKind::GroupJoinRequest,
        }
    }

    /// The original host discriminator, for wire round-trips.
    pub fn sub_kind(&self) -> i32 {
        match self {
            Self::PrivateMessage(ev) => ev.source.code(),
            Self::GroupMessage(ev) => ev.session.code(),
            Self::DiscussMessage(_) => 1,
            Self::GroupAdminChange(ev) => ev.change.code(),
            Self::GroupMemberDecrease(ev) => ev.reason.code(),
            Self::GroupMemberIncrease(ev) => ev.method.code(),
            Self::FriendAdded(_) => 1,
            Self::FriendRequest(_) => 1,
            Self::GroupJoinRequest(ev) => ev.kind.code(),
        }
    }

    /// The shared envelope of this event.
    pub fn envelope(&self) -> &EventEnvelope {
        match self {
            Self::PrivateMessage(ev) => &ev.envelope,
            Self::GroupMessage(ev) => &ev.envelope,
            Self::DiscussMessage(ev) => &ev.envelope,
            Self::GroupAdminChange(ev) => &ev.envelope,
            Self::GroupMemberDecrease(ev) => &ev.envelope,
            Self::GroupMemberIncrease(ev) => &ev.envelope,
            Self::FriendAdded(ev) => &ev.envelope,
            Self::FriendRequest(ev) => &ev.envelope,
            Self::GroupJoinRequest(ev) => &ev.envelope,
        }
    }

    fn envelope_mut(&mut self) -> &mut EventEnvelope {
        match self {
            Self::PrivateMessage(ev) => &mut ev.envelope,
            Self::GroupMessage(ev) => &mut ev.envelope,
            Self::DiscussMessage(ev) => &mut ev.envelope,
            Self::GroupAdminChange(ev) => &mut ev.envelope,
            Self::GroupMemberDecrease(ev) => &mut ev.envelope,
            Self::GroupMemberIncrease(ev) => &mut ev.envelope,
            Self::FriendAdded(ev) => &mut ev.envelope,
            Self::FriendRequest(ev) => &mut ev.envelope,
            Self::GroupJoinRequest(ev) => &mut ev.envelope,
        }
    }

    /// Returns whether a handler has claimed this event.
    pub fn handled(&self) -> bool {
        self.envelope().handled()
    }

    /// Marks the event as handled, short-circuiting the handler chain.
    pub fn mark_handled(&mut self) {
        self.envelope_mut().mark_handled();
    }

    /// The unrendered textual payload, for kinds that carry one.
    pub fn message_text(&self) -> Option<&str> {
        match self {
            Self::PrivateMessage(ev) => Some(&ev.text),
            Self::GroupMessage(ev) => Some(&ev.text),
            Self::DiscussMessage(ev) => Some(&ev.text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_group_message_from_raw_fields() {
        let raw = RawNotification::new(1)
            .with_message_id(42)
            .with_user_id(123)
            .with_group_id(456)
            .with_text("hi");

        let event = Event::build(EventKind::GroupMessage, raw).unwrap();
        assert_eq!(event.kind(), EventKind::GroupMessage);
        assert_eq!(event.sub_kind(), 1);
        assert!(!event.handled());

        let Event::GroupMessage(msg) = event else {
            panic!("wrong variant");
        };
        assert_eq!(msg.envelope.origin_id, 123);
        assert_eq!(msg.group_id, 456);
        assert_eq!(msg.message_id, 42);
        assert_eq!(msg.text, "hi");
        assert!(msg.anonymous.is_none());
    }

    #[test]
    fn private_sub_kinds_round_trip_their_codes() {
        for code in [1, 2, 3, 11] {
            let raw = RawNotification::new(code).with_user_id(1);
            let event = Event::build(EventKind::PrivateMessage, raw).unwrap();
            assert_eq!(event.sub_kind(), code);
        }
    }

    #[test]
    fn unknown_sub_kind_is_rejected() {
        let raw = RawNotification::new(7).with_user_id(1);
        let err = Event::build(EventKind::PrivateMessage, raw).unwrap_err();
        let BuildError::UnknownSubKind { kind, code } = err;
        assert_eq!(kind, EventKind::PrivateMessage);
        assert_eq!(code, 7);
    }

    #[test]
    fn admin_change_origin_is_the_operated_account() {
        let raw = RawNotification::new(2)
            .with_group_id(900)
            .with_target_id(77)
            .with_timestamp(1_700_000_000);
        let event = Event::build(EventKind::GroupAdminChange, raw).unwrap();
        assert_eq!(event.envelope().origin_id, 77);
        assert_eq!(event.sub_kind(), 2);
    }

    #[test]
    fn handled_only_moves_forward() {
        let raw = RawNotification::new(1).with_user_id(5).with_text("x");
        let mut event = Event::build(EventKind::PrivateMessage, raw).unwrap();
        assert!(!event.handled());
        event.mark_handled();
        event.mark_handled();
        assert!(event.handled());
    }
}
