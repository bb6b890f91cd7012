mod ws_handler;

use axum::{Router, routing::get};

use crate::room::RoomRegistry;

pub use ws_handler::*;

/// The signaling routes: one long-lived WebSocket endpoint addressed
/// by room id and participant id.
pub fn router(registry: RoomRegistry) -> Router {
    Router::new()
        .route("/ws/{room_id}/{peer_id}", get(ws_handler))
        .with_state(registry)
}
