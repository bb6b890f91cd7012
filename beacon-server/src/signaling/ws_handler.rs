use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use beacon_core::{ClientMessage, PeerId, RoomId, ServerEvent};
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use crate::room::{RoomError, RoomHandle, RoomRegistry};
use crate::transport::{Outbound, PeerConn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path((room_id, peer_id)): Path<(String, String)>,
    State(registry): State<RoomRegistry>,
) -> impl IntoResponse {
    let room_id = RoomId::from(room_id);
    let peer_id = PeerId::from(peer_id);

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, peer_id, registry))
}

async fn handle_socket(
    socket: WebSocket,
    room_id: RoomId,
    peer_id: PeerId,
    registry: RoomRegistry,
) {
    info!(%room_id, %peer_id, "new websocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (conn, mut rx) = PeerConn::pair();

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                Outbound::Text(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    let Some(room) = admit(&registry, &room_id, &peer_id, &conn).await else {
        // Rejected: flush the error frame and the close, never a member.
        let _ = send_task.await;
        return;
    };

    let mut recv_task = tokio::spawn({
        let room = room.clone();
        let peer_id = peer_id.clone();
        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        match ClientMessage::decode(text.as_str()) {
                            Ok(decoded) => {
                                if room.send(peer_id.clone(), decoded).await.is_err() {
                                    break;
                                }
                            }
                            // One bad frame never ends the connection.
                            Err(e) => {
                                warn!(%peer_id, error = %e, "dropping malformed frame");
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // Runs exactly once per connection, whatever ended the loop
    // (client close, transport error, kick). Kicked peers were already
    // removed by the room; their leave is a no-op there.
    let _ = room.leave(peer_id.clone()).await;
    info!(%room_id, %peer_id, "websocket disconnected");
}

/// Resolves the room and requests admission. `None` means the join was
/// rejected (locked room) and the error event plus close are queued.
async fn admit(
    registry: &RoomRegistry,
    room_id: &RoomId,
    peer_id: &PeerId,
    conn: &PeerConn,
) -> Option<RoomHandle> {
    loop {
        let handle = registry.get_or_create(room_id, peer_id);
        match handle.join(peer_id.clone(), conn.clone()).await {
            Ok(()) => return Some(handle),
            Err(RoomError::Locked(_)) => {
                info!(%room_id, %peer_id, "join rejected: room is locked");
                let _ = conn.send_event(&ServerEvent::Error {
                    message: "Room is locked".to_owned(),
                });
                conn.close();
                return None;
            }
            // Lost the race against destroy-on-empty; a fresh room
            // takes the id on the next pass.
            Err(RoomError::Closed(_)) => continue,
        }
    }
}
