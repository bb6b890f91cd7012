use std::time::Duration;

use beacon_core::{PeerId, RoomId, ServerEvent};
use beacon_server::{Outbound, PeerConn, RoomError, RoomHandle, RoomRegistry};
use tokio::sync::mpsc;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A fake connection: the handle the room holds, plus the receiver a
/// real socket pump would drain.
pub struct TestPeer {
    pub id: PeerId,
    pub conn: PeerConn,
    pub rx: mpsc::UnboundedReceiver<Outbound>,
}

impl TestPeer {
    pub fn new(id: &str) -> Self {
        let (conn, rx) = PeerConn::pair();
        Self {
            id: PeerId::from(id),
            conn,
            rx,
        }
    }

    /// Joins `room`, asserting admission.
    pub async fn join(
        &self,
        registry: &RoomRegistry,
        room: &RoomId,
    ) -> RoomHandle {
        self.try_join(registry, room)
            .await
            .expect("join should be admitted")
    }

    pub async fn try_join(
        &self,
        registry: &RoomRegistry,
        room: &RoomId,
    ) -> Result<RoomHandle, RoomError> {
        let handle = registry.get_or_create(room, &self.id);
        handle.join(self.id.clone(), self.conn.clone()).await?;
        Ok(handle)
    }

    /// Next queued frame, decoded as a server event.
    pub async fn recv_event(&mut self) -> ServerEvent {
        match self.recv_frame().await {
            Outbound::Text(text) => serde_json::from_str(&text)
                .expect("frame should be a server event"),
            Outbound::Close => panic!("expected an event, got a close frame"),
        }
    }

    /// Next queued frame, as raw text.
    pub async fn recv_text(&mut self) -> String {
        match self.recv_frame().await {
            Outbound::Text(text) => text,
            Outbound::Close => panic!("expected text, got a close frame"),
        }
    }

    pub async fn recv_frame(&mut self) -> Outbound {
        tokio::time::timeout(Duration::from_secs(1), self.rx.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection channel closed")
    }

    /// Asserts nothing is queued. Callers synchronize with the room
    /// first (`handle.info().await` round-trips the actor loop).
    pub fn assert_silent(&mut self) {
        assert!(
            self.rx.try_recv().is_err(),
            "expected no frames for {}",
            self.id
        );
    }

    /// Drains everything currently queued.
    pub fn drain(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}
