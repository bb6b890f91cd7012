use serde::{Deserialize, Serialize};

use crate::model::PeerId;

/// Server-originated events, serialized as `{"type": "...", ...}` with
/// the casing the browser clients expect: kebab-case type tags and
/// camelCase `userId`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Broadcast to the whole room (joiner included) on admission.
    /// `users` is the full member list in join order.
    UserJoined {
        #[serde(rename = "userId")]
        user_id: PeerId,
        users: Vec<PeerId>,
        host: PeerId,
    },

    /// Broadcast when a member departs. `host` carries the current
    /// host on the disconnect path (post-promotion); it is omitted on
    /// a plain kick.
    UserLeft {
        #[serde(rename = "userId")]
        user_id: PeerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        host: Option<PeerId>,
    },

    /// Broadcast after a host lock or unlock.
    RoomLocked { locked: bool },

    /// Sent only on a rejected join, just before the close.
    Error { message: String },

    /// Sent only to the removed member, just before the forced close.
    Kicked,

    /// Broadcast chat line with the sender id attached.
    Chat {
        #[serde(rename = "userId")]
        user_id: PeerId,
        message: String,
    },

    /// Broadcast hand-raise with the sender id attached.
    RaiseHand {
        #[serde(rename = "userId")]
        user_id: PeerId,
    },
}
