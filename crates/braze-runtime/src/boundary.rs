//! The host callback boundary.
//!
//! The host delivers notifications as plain function calls with positional
//! primitive fields and expects a raw integer verdict back: `0` to continue
//! default processing, `1` to suppress it. [`CallbackGateway`] is that
//! surface — one entry point per notification kind, each packing the fields
//! into a [`RawNotification`] and delegating to the shared engine.
//!
//! Nothing escapes across this boundary: unknown sub-kinds, handler errors
//! and handler panics are all absorbed inside
//! [`DispatchEngine::dispatch`](braze_core::DispatchEngine), so every
//! invocation produces exactly one verdict.

use std::sync::Arc;

use braze_core::{Anonymous, DispatchEngine, EventKind, RawNotification};

/// Verdict code: the host continues default processing.
pub const VERDICT_IGNORED: i32 = 0;
/// Verdict code: the host suppresses default processing.
pub const VERDICT_INTERCEPTED: i32 = 1;

/// The inbound callback surface handed to the host integration layer.
///
/// Cheap to clone; all clones dispatch through the same engine.
#[derive(Clone)]
pub struct CallbackGateway {
    engine: Arc<DispatchEngine>,
}

impl CallbackGateway {
    /// Creates a gateway over the shared engine.
    pub fn new(engine: Arc<DispatchEngine>) -> Self {
        Self { engine }
    }

    fn dispatch(&self, kind: EventKind, raw: RawNotification) -> i32 {
        self.engine.dispatch(kind, raw).code()
    }

    /// A private message arrived.
    pub fn on_private_message(
        &self,
        sub_kind: i32,
        message_id: i32,
        user_id: i64,
        message: &str,
        font: i32,
    ) -> i32 {
        let raw = RawNotification::new(sub_kind)
            .with_message_id(message_id)
            .with_user_id(user_id)
            .with_text(message)
            .with_font(font);
        self.dispatch(EventKind::PrivateMessage, raw)
    }

    /// A group message arrived. `anonymous` is already decoded by the host
    /// integration layer when the sender posted anonymously.
    #[allow(clippy::too_many_arguments)]
    pub fn on_group_message(
        &self,
        sub_kind: i32,
        message_id: i32,
        group_id: i64,
        user_id: i64,
        anonymous: Option<Anonymous>,
        message: &str,
        font: i32,
    ) -> i32 {
        let mut raw = RawNotification::new(sub_kind)
            .with_message_id(message_id)
            .with_group_id(group_id)
            .with_user_id(user_id)
            .with_text(message)
            .with_font(font);
        raw.anonymous = anonymous;
        self.dispatch(EventKind::GroupMessage, raw)
    }

    /// A discuss-session message arrived.
    pub fn on_discuss_message(
        &self,
        sub_kind: i32,
        message_id: i32,
        discuss_id: i64,
        user_id: i64,
        message: &str,
        font: i32,
    ) -> i32 {
        let raw = RawNotification::new(sub_kind)
            .with_message_id(message_id)
            .with_discuss_id(discuss_id)
            .with_user_id(user_id)
            .with_text(message)
            .with_font(font);
        self.dispatch(EventKind::DiscussMessage, raw)
    }

    /// A member's admin rights changed.
    pub fn on_group_admin_change(
        &self,
        sub_kind: i32,
        timestamp: i64,
        group_id: i64,
        target_id: i64,
    ) -> i32 {
        let raw = RawNotification::new(sub_kind)
            .with_timestamp(timestamp)
            .with_group_id(group_id)
            .with_target_id(target_id);
        self.dispatch(EventKind::GroupAdminChange, raw)
    }

    /// A member left or was removed from a group.
    pub fn on_group_member_decrease(
        &self,
        sub_kind: i32,
        timestamp: i64,
        group_id: i64,
        operator_id: i64,
        target_id: i64,
    ) -> i32 {
        let raw = RawNotification::new(sub_kind)
            .with_timestamp(timestamp)
            .with_group_id(group_id)
            .with_user_id(operator_id)
            .with_target_id(target_id);
        self.dispatch(EventKind::GroupMemberDecrease, raw)
    }

    /// A member joined a group.
    pub fn on_group_member_increase(
        &self,
        sub_kind: i32,
        timestamp: i64,
        group_id: i64,
        operator_id: i64,
        target_id: i64,
    ) -> i32 {
        let raw = RawNotification::new(sub_kind)
            .with_timestamp(timestamp)
            .with_group_id(group_id)
            .with_user_id(operator_id)
            .with_target_id(target_id);
        self.dispatch(EventKind::GroupMemberIncrease, raw)
    }

    /// An account became a friend.
    pub fn on_friend_added(&self, sub_kind: i32, timestamp: i64, user_id: i64) -> i32 {
        let raw = RawNotification::new(sub_kind)
            .with_timestamp(timestamp)
            .with_user_id(user_id);
        self.dispatch(EventKind::FriendAdded, raw)
    }

    /// An account asked to become a friend.
    pub fn on_friend_request(
        &self,
        sub_kind: i32,
        timestamp: i64,
        user_id: i64,
        verify_text: &str,
        flag: &str,
    ) -> i32 {
        let raw = RawNotification::new(sub_kind)
            .with_timestamp(timestamp)
            .with_user_id(user_id)
            .with_text(verify_text)
            .with_flag(flag);
        self.dispatch(EventKind::FriendRequest, raw)
    }

    /// An account asked to join a group, or the bot was invited into one.
    pub fn on_group_join_request(
        &self,
        sub_kind: i32,
        timestamp: i64,
        group_id: i64,
        user_id: i64,
        verify_text: &str,
        flag: &str,
    ) -> i32 {
        let raw = RawNotification::new(sub_kind)
            .with_timestamp(timestamp)
            .with_group_id(group_id)
            .with_user_id(user_id)
            .with_text(verify_text)
            .with_flag(flag);
        self.dispatch(EventKind::GroupJoinRequest, raw)
    }
}

impl std::fmt::Debug for CallbackGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackGateway").finish_non_exhaustive()
    }
}
