use beacon_core::{ClientMessage, PeerId, RoomId};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::room::command::{JoinRejected, RoomCommand, RoomInfo};
use crate::transport::PeerConn;

/// Errors surfaced by room operations.
#[derive(Debug, Error)]
pub enum RoomError {
    /// The room is locked and the joiner is not its host.
    #[error("room {0} is locked")]
    Locked(RoomId),

    /// The room destroyed itself; the registry entry is stale or gone.
    /// Callers retry `get_or_create` against a fresh room.
    #[error("room {0} is gone")]
    Closed(RoomId),
}

/// Handle to a running room actor. Cheap to clone; the registry holds
/// one per live room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub(crate) fn new(room_id: RoomId, tx: mpsc::Sender<RoomCommand>) -> Self {
        Self { room_id, tx }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub(crate) fn same_channel(&self, tx: &mpsc::Sender<RoomCommand>) -> bool {
        self.tx.same_channel(tx)
    }

    /// Requests admission. The `user-joined` broadcast has already
    /// been queued to every member when this returns `Ok`.
    pub async fn join(
        &self,
        peer: PeerId,
        conn: PeerConn,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(RoomCommand::Join {
                peer,
                conn,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))?;
        match reply_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(JoinRejected)) => Err(RoomError::Locked(self.room_id.clone())),
            Err(_) => Err(RoomError::Closed(self.room_id.clone())),
        }
    }

    /// Removes the peer and waits for the cleanup (including any
    /// `user-left` broadcast and host promotion) to be applied.
    pub async fn leave(&self, peer: PeerId) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(RoomCommand::Leave {
                peer,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))
    }

    /// Forwards a decoded message for routing (fire-and-forget).
    pub async fn send(
        &self,
        peer: PeerId,
        msg: ClientMessage,
    ) -> Result<(), RoomError> {
        self.tx
            .send(RoomCommand::Inbound { peer, msg })
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))
    }

    /// Requests a state snapshot.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Closed(self.room_id.clone()))
    }
}
