//! The host command surface.
//!
//! Every operation is synchronous call-and-return, mirroring the host's own
//! API convention: send operations answer with a message id (`<= 0` is the
//! host's failure sentinel), lookups answer with a record or `None`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The command surface exposed by the host process.
///
/// The host documents its API as not reentrant from multiple threads, so
/// callers serialize command execution (see
/// [`CommandAdapter`](crate::CommandAdapter)). Implementations should not
/// add their own locking.
pub trait HostApi: Send + Sync {
    /// Sends a message to a group. Returns the message id, `<= 0` on failure.
    fn send_group_message(&self, group_id: i64, message: &str) -> i32;

    /// Sends a private message. Returns the message id, `<= 0` on failure.
    fn send_private_message(&self, user_id: i64, message: &str) -> i32;

    /// Sends a message to a discuss session. Returns the message id, `<= 0`
    /// on failure.
    fn send_discuss_message(&self, discuss_id: i64, message: &str) -> i32;

    /// The account id the bot is logged in as.
    fn login_id(&self) -> i64;

    /// The nickname of the logged-in account.
    fn login_nickname(&self) -> String;

    /// Looks up an account outside the bot's contact list.
    fn stranger_info(&self, user_id: i64) -> Option<StrangerInfo>;

    /// Looks up one member of a group.
    fn group_member_info(&self, group_id: i64, user_id: i64) -> Option<GroupMemberInfo>;

    /// Lists the members of a group. Empty when the group is unknown.
    fn group_member_list(&self, group_id: i64) -> Vec<GroupMemberInfo>;

    /// Lists the bot's friends.
    fn friend_list(&self) -> Vec<FriendInfo>;

    /// Lists the groups the bot is a member of.
    fn group_list(&self) -> Vec<GroupInfo>;
}

/// A boxed host API handle shared across the bridge.
pub type BoxedHostApi = Arc<dyn HostApi>;

// =============================================================================
// Host records
// =============================================================================

/// Account metadata for a user outside the contact list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrangerInfo {
    /// The account id.
    pub id: i64,
    /// The account nickname.
    pub nickname: String,
    /// Reported gender ("male", "female", "unknown").
    #[serde(default)]
    pub sex: String,
    /// Reported age.
    #[serde(default)]
    pub age: i32,
}

/// Metadata for one group member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupMemberInfo {
    /// The group the membership belongs to.
    pub group_id: i64,
    /// The member's account id.
    pub id: i64,
    /// The account nickname.
    pub nickname: String,
    /// The in-group display name, empty when unset.
    #[serde(default)]
    pub card: String,
    /// Reported gender.
    #[serde(default)]
    pub sex: String,
    /// Reported age.
    #[serde(default)]
    pub age: i32,
    /// When the member joined, as a unix timestamp.
    #[serde(default)]
    pub join_time: i64,
    /// When the member last spoke, as a unix timestamp.
    #[serde(default)]
    pub last_sent_time: i64,
    /// The member's role: "owner", "admin" or "member".
    #[serde(default)]
    pub role: String,
}

/// One entry of the friend list as the host reports it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FriendInfo {
    /// The friend's account id.
    pub id: i64,
    /// The account nickname.
    pub nickname: String,
    /// The local remark name, empty when unset.
    #[serde(default)]
    pub remark: String,
    /// Reported gender.
    #[serde(default)]
    pub sex: String,
    /// Reported age.
    #[serde(default)]
    pub age: i32,
}

/// One entry of the group list as the host reports it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupInfo {
    /// The group id.
    pub id: i64,
    /// The group name.
    pub name: String,
    /// Current member count.
    #[serde(default)]
    pub member_count: i32,
    /// Member capacity.
    #[serde(default)]
    pub max_member_count: i32,
    /// The owning account id.
    #[serde(default)]
    pub owner_id: i64,
}
