//! Wire format: publish frames out, command envelopes in.
//!
//! Published events are flat JSON objects. Every frame carries `sub_type`,
//! `message_id`, `user_id`, `anonymous`, `message` and `raw_message`, plus
//! the kind-specific container id (`group_id` or `discuss_id`). Kinds
//! without a textual payload carry `null` in the message fields.
//!
//! Inbound frames are `{ "action": <string>, "params": <object> }`. A frame
//! that does not parse into that shape is dropped by the caller — the
//! protocol tolerates malformed probes silently.

use serde::Deserialize;
use serde_json::{Value, json};

use braze_core::{Event, text};

/// An inbound command envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    /// The remote action name.
    pub action: String,
    /// Action parameters; `null` when the frame omitted them.
    #[serde(default)]
    pub params: Value,
}

impl CommandRequest {
    /// Parses one inbound frame. `None` for anything malformed.
    pub fn parse(frame: &str) -> Option<Self> {
        serde_json::from_str(frame).ok()
    }
}

/// Maps an event onto its publish frame.
///
/// Only message kinds and admin changes are mirrored to subscribers; every
/// other kind returns `None` and is not published.
pub fn publish_frame(event: &Event) -> Option<Value> {
    let frame = match event {
        Event::PrivateMessage(ev) => json!({
            "sub_type": ev.source.code(),
            "message_id": ev.message_id,
            "user_id": ev.envelope.origin_id,
            "anonymous": Value::Null,
            "message": text::display_text(&ev.text),
            "raw_message": ev.text,
        }),
        Event::GroupMessage(ev) => json!({
            "sub_type": ev.session.code(),
            "message_id": ev.message_id,
            "user_id": ev.envelope.origin_id,
            "group_id": ev.group_id,
            "anonymous": ev.anonymous,
            "message": text::display_text(&ev.text),
            "raw_message": ev.text,
        }),
        Event::DiscussMessage(ev) => json!({
            "sub_type": 1,
            "message_id": ev.message_id,
            "user_id": ev.envelope.origin_id,
            "discuss_id": ev.discuss_id,
            "anonymous": Value::Null,
            "message": text::display_text(&ev.text),
            "raw_message": ev.text,
        }),
        Event::GroupAdminChange(ev) => json!({
            "sub_type": ev.change.code(),
            "message_id": Value::Null,
            "user_id": ev.envelope.origin_id,
            "group_id": ev.group_id,
            "anonymous": Value::Null,
            "message": Value::Null,
            "raw_message": Value::Null,
        }),
        _ => return None,
    };
    Some(frame)
}
