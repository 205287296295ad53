//! Remote action relay onto the host command surface.
//!
//! The bridge hands every recognized inbound request to
//! [`CommandAdapter::execute`], which resolves the action name against a
//! fixed table, pulls the required parameters out of the request's `params`
//! object and calls the host. The result is the bare JSON value written back
//! to the subscriber — a message id for sends, a record (or `null`) for
//! lookups, a projected array for the list actions.

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::api::{BoxedHostApi, FriendInfo, GroupInfo};

/// Relays named remote actions onto the host API.
///
/// Host command execution is serialized behind a mutex: the host does not
/// document its API as reentrant, and the bridge calls in from multiple
/// connection tasks.
pub struct CommandAdapter {
    host: BoxedHostApi,
    gate: Mutex<()>,
}

impl CommandAdapter {
    /// Creates an adapter over the given host handle.
    pub fn new(host: BoxedHostApi) -> Self {
        Self {
            host,
            gate: Mutex::new(()),
        }
    }

    /// Executes a named action against the host.
    ///
    /// Returns the JSON value to reply with, or `None` when no reply is due:
    /// the action is unknown, or a required parameter is absent from
    /// `params`. Both cases are intentionally silent — the protocol
    /// tolerates malformed probes without surfacing errors.
    pub fn execute(&self, action: &str, params: &Value) -> Option<Value> {
        let _guard = self.gate.lock();
        trace!(action, "executing remote action");

        let result = match action {
            "SendGroupMessage" => {
                let group_id = param_i64(params, "group_id")?;
                let message = param_str(params, "message")?;
                json!(self.host.send_group_message(group_id, message))
            }
            "SendPrivateMessage" => {
                let user_id = param_i64(params, "user_id")?;
                let message = param_str(params, "message")?;
                json!(self.host.send_private_message(user_id, message))
            }
            "SendDiscussMessage" => {
                let discuss_id = param_i64(params, "discuss_id")?;
                let message = param_str(params, "message")?;
                json!(self.host.send_discuss_message(discuss_id, message))
            }
            "GetLoginQQ" => json!(self.host.login_id()),
            "GetLoginNick" => json!(self.host.login_nickname()),
            "GetStrangerInfo" => {
                let user_id = param_i64(params, "user_id")?;
                // `null` is the lookup failure sentinel, not a protocol error.
                json!(self.host.stranger_info(user_id))
            }
            "GetGroupMemberInfo" => {
                let group_id = param_i64(params, "group_id")?;
                let user_id = param_i64(params, "user_id")?;
                json!(self.host.group_member_info(group_id, user_id))
            }
            "GetGroupMemberList" => {
                let group_id = param_i64(params, "group_id")?;
                json!(self.host.group_member_list(group_id))
            }
            "GetFriendList" => {
                let friends: Vec<FriendSummary> =
                    self.host.friend_list().iter().map(Into::into).collect();
                json!(friends)
            }
            "GetGroupList" => {
                let groups: Vec<GroupSummary> =
                    self.host.group_list().iter().map(Into::into).collect();
                json!(groups)
            }
            _ => {
                debug!(action, "unmatched remote action");
                return None;
            }
        };

        Some(result)
    }
}

impl std::fmt::Debug for CommandAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandAdapter").finish_non_exhaustive()
    }
}

fn param_i64(params: &Value, key: &str) -> Option<i64> {
    params.get(key)?.as_i64()
}

fn param_str<'p>(params: &'p Value, key: &str) -> Option<&'p str> {
    params.get(key)?.as_str()
}

// =============================================================================
// Transport projections
// =============================================================================

/// The subset of [`FriendInfo`] exposed over the wire.
#[derive(Debug, Clone, Serialize)]
pub struct FriendSummary {
    pub nickname: String,
    pub id: i64,
    pub remark: String,
}

impl From<&FriendInfo> for FriendSummary {
    fn from(info: &FriendInfo) -> Self {
        Self {
            nickname: info.nickname.clone(),
            id: info.id,
            remark: info.remark.clone(),
        }
    }
}

/// The subset of [`GroupInfo`] exposed over the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub id: i64,
    pub name: String,
    pub current_member_count: i32,
    pub max_member_count: i32,
}

impl From<&GroupInfo> for GroupSummary {
    fn from(info: &GroupInfo) -> Self {
        Self {
            id: info.id,
            name: info.name.clone(),
            current_member_count: info.member_count,
            max_member_count: info.max_member_count,
        }
    }
}
