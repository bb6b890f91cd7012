use beacon_core::ServerEvent;
use thiserror::Error;
use tokio::sync::mpsc;

/// A frame queued for one peer's socket pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A text frame to deliver as-is.
    Text(String),
    /// Close the socket after flushing everything queued before it.
    Close,
}

/// Why a send did not reach the peer's pump.
#[derive(Debug, Error)]
pub enum SendError {
    /// The pump task is gone; the peer is already disconnected.
    #[error("peer connection closed")]
    Closed,

    /// Event serialization failed. A server bug, not a disconnect.
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Handle to one peer's outbound message stream.
///
/// Cheap to clone; the receiver half lives in the connection's socket
/// pump task (or in a test harness standing in for one).
#[derive(Debug, Clone)]
pub struct PeerConn {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl PeerConn {
    /// Creates a handle together with the receiver its pump drains.
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Serializes and queues a server event.
    pub fn send_event(&self, event: &ServerEvent) -> Result<(), SendError> {
        let text = serde_json::to_string(event)?;
        self.send_raw(&text)
    }

    /// Queues a text frame verbatim.
    pub fn send_raw(&self, text: &str) -> Result<(), SendError> {
        self.tx
            .send(Outbound::Text(text.to_owned()))
            .map_err(|_| SendError::Closed)
    }

    /// Queues a close frame. Best effort: a peer that already vanished
    /// has nothing left to close.
    pub fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::PeerId;

    #[test]
    fn send_event_delivers_serialized_json() {
        let (conn, mut rx) = PeerConn::pair();
        conn.send_event(&ServerEvent::RaiseHand {
            user_id: PeerId::from("alice"),
        })
        .unwrap();

        let Some(Outbound::Text(text)) = rx.try_recv().ok() else {
            panic!("expected a text frame");
        };
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["type"], "raise-hand");
        assert_eq!(json["userId"], "alice");
    }

    #[test]
    fn send_after_receiver_dropped_is_closed() {
        let (conn, rx) = PeerConn::pair();
        drop(rx);
        assert!(matches!(conn.send_raw("hello"), Err(SendError::Closed)));
    }

    #[test]
    fn close_queues_a_close_frame() {
        let (conn, mut rx) = PeerConn::pair();
        conn.send_raw("bye").unwrap();
        conn.close();

        assert_eq!(rx.try_recv().unwrap(), Outbound::Text("bye".to_owned()));
        assert_eq!(rx.try_recv().unwrap(), Outbound::Close);
    }
}
