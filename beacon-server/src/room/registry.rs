use std::sync::Arc;

use beacon_core::{PeerId, RoomId};
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::room::command::RoomCommand;
use crate::room::handle::RoomHandle;
use crate::room::room::spawn_room;

/// Process-wide room registry: the only shared mutable state.
///
/// Rooms exist while they have members. A room actor deregisters
/// itself the moment its last member leaves, so a present entry always
/// has at least one member; emptiness and absence are the same
/// external state.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
        }
    }

    /// Returns the live room, spawning one with `first_peer` as its
    /// designated host when the id is absent. Atomic with respect to
    /// concurrent creation of the same id (DashMap entry API).
    ///
    /// The returned handle may already point at a room that destroyed
    /// itself; `RoomHandle::join` then fails with `Closed` and the
    /// caller retries.
    pub fn get_or_create(
        &self,
        room_id: &RoomId,
        first_peer: &PeerId,
    ) -> RoomHandle {
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                spawn_room(room_id.clone(), first_peer.clone(), self.clone())
            })
            .value()
            .clone()
    }

    /// Lookup without creation.
    pub fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Called by a room actor when its last member leaves. The channel
    /// identity guard keeps a racing replacement room intact.
    pub(crate) fn deregister(
        &self,
        room_id: &RoomId,
        tx: &mpsc::Sender<RoomCommand>,
    ) {
        self.rooms
            .remove_if(room_id, |_, handle| handle.same_channel(tx));
    }
}
