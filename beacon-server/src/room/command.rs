use beacon_core::{ClientMessage, PeerId, RoomId};
use tokio::sync::oneshot;

use crate::transport::PeerConn;

/// Commands accepted by a room actor. Reply channels are present
/// wherever the caller must observe the outcome before proceeding.
pub enum RoomCommand {
    /// Admission request from a freshly upgraded connection.
    Join {
        peer: PeerId,
        conn: PeerConn,
        reply: oneshot::Sender<Result<(), JoinRejected>>,
    },

    /// Departure, for any reason. A no-op for non-members, which makes
    /// the disconnect cleanup idempotent against kicks.
    Leave {
        peer: PeerId,
        reply: oneshot::Sender<()>,
    },

    /// A routed message from a member (fire-and-forget).
    Inbound { peer: PeerId, msg: ClientMessage },

    /// Snapshot of the live state.
    Info { reply: oneshot::Sender<RoomInfo> },
}

/// Join refusal: the room is locked and the joiner is not its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRejected;

/// Metadata snapshot of one room, taken inside its actor loop.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    /// Member ids in join order.
    pub members: Vec<PeerId>,
    pub host: PeerId,
    pub locked: bool,
}
