//! Room actor: one Tokio task owning all state for one room.
//!
//! Membership, host identity and the lock flag are only ever touched
//! from inside the actor loop, so every operation on a room is
//! serialized without locks and rooms stay independent units of
//! concurrency. Broadcast order therefore matches the order commands
//! were applied, per receiving connection.

use beacon_core::{ClientMessage, PeerId, RoomId, ServerEvent};
use indexmap::IndexMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::room::command::{JoinRejected, RoomCommand, RoomInfo};
use crate::room::handle::RoomHandle;
use crate::room::registry::RoomRegistry;
use crate::transport::{PeerConn, SendError};

/// Command channel depth per room; senders wait when it fills.
const COMMAND_CHANNEL_SIZE: usize = 64;

/// Spawns a room actor task and returns the handle the registry keeps.
pub(crate) fn spawn_room(
    room_id: RoomId,
    host: PeerId,
    registry: RoomRegistry,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

    let room = Room {
        room_id: room_id.clone(),
        members: IndexMap::new(),
        host,
        locked: false,
        password: String::new(),
        ever_joined: false,
        registry,
        tx: tx.clone(),
        rx,
    };
    tokio::spawn(room.run());

    RoomHandle::new(room_id, tx)
}

struct Room {
    room_id: RoomId,

    /// Join-ordered membership. The order drives host re-election, so
    /// removals must preserve it (`shift_remove`, never `swap_remove`).
    members: IndexMap<PeerId, PeerConn>,

    /// Always a key of `members` while `members` is non-empty.
    host: PeerId,

    locked: bool,

    /// Set on lock, never checked against joiners; the lock gate is
    /// host identity.
    #[allow(dead_code)]
    password: String,

    /// Distinguishes a fresh room awaiting its creator from one whose
    /// last member just left (which must be destroyed).
    ever_joined: bool,

    registry: RoomRegistry,
    tx: mpsc::Sender<RoomCommand>,
    rx: mpsc::Receiver<RoomCommand>,
}

impl Room {
    async fn run(mut self) {
        info!(room = %self.room_id, host = %self.host, "room created");

        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                RoomCommand::Join { peer, conn, reply } => {
                    let result = self.handle_join(peer, conn);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { peer, reply } => {
                    self.handle_leave(&peer);
                    let _ = reply.send(());
                }
                RoomCommand::Inbound { peer, msg } => {
                    self.route(&peer, msg);
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
            }

            // Emptiness and absence are the same external state: the
            // instant the last member is gone, the room is too.
            if self.ever_joined && self.members.is_empty() {
                self.registry.deregister(&self.room_id, &self.tx);
                info!(room = %self.room_id, "room destroyed");
                break;
            }
        }
    }

    fn handle_join(
        &mut self,
        peer: PeerId,
        conn: PeerConn,
    ) -> Result<(), JoinRejected> {
        if self.members.is_empty() {
            // First admitted participant hosts. Normally the creator,
            // but if another joiner slips in ahead of it, the room
            // must not start with an absent host.
            self.host = peer.clone();
        } else if self.locked && peer != self.host {
            debug!(room = %self.room_id, %peer, "join rejected: locked");
            return Err(JoinRejected);
        }

        // Duplicate id: last writer wins, original position kept.
        self.members.insert(peer.clone(), conn);
        self.ever_joined = true;
        info!(
            room = %self.room_id,
            %peer,
            members = self.members.len(),
            "peer joined"
        );

        self.broadcast(&ServerEvent::UserJoined {
            user_id: peer,
            users: self.member_ids(),
            host: self.host.clone(),
        });
        Ok(())
    }

    fn handle_leave(&mut self, peer: &PeerId) {
        if self.members.shift_remove(peer).is_none() {
            // Already removed (kick, or lazy removal on send failure).
            return;
        }
        info!(
            room = %self.room_id,
            %peer,
            members = self.members.len(),
            "peer left"
        );

        if self.members.is_empty() {
            // No recipients; run() destroys the room next.
            return;
        }
        if *peer == self.host {
            self.promote_earliest();
        }
        self.broadcast(&ServerEvent::UserLeft {
            user_id: peer.clone(),
            host: Some(self.host.clone()),
        });
    }

    fn route(&mut self, sender: &PeerId, msg: ClientMessage) {
        if !self.members.contains_key(sender) {
            debug!(room = %self.room_id, peer = %sender, "message from non-member, ignoring");
            return;
        }

        match msg {
            ClientMessage::Relay { target, raw } => {
                self.unicast_raw(&target, &raw);
            }
            ClientMessage::Chat { message } => {
                self.broadcast(&ServerEvent::Chat {
                    user_id: sender.clone(),
                    message,
                });
            }
            ClientMessage::RaiseHand => {
                self.broadcast(&ServerEvent::RaiseHand {
                    user_id: sender.clone(),
                });
            }
            ClientMessage::SetPassword { password } => {
                if *sender != self.host {
                    debug!(room = %self.room_id, peer = %sender, "set-password from non-host, ignoring");
                    return;
                }
                self.password = password;
                self.locked = true;
                info!(room = %self.room_id, "room locked");
                self.broadcast(&ServerEvent::RoomLocked { locked: true });
            }
            ClientMessage::UnlockRoom => {
                if *sender != self.host {
                    debug!(room = %self.room_id, peer = %sender, "unlock-room from non-host, ignoring");
                    return;
                }
                // Idempotent; the broadcast fires even when already
                // unlocked.
                self.locked = false;
                info!(room = %self.room_id, "room unlocked");
                self.broadcast(&ServerEvent::RoomLocked { locked: false });
            }
            ClientMessage::Kick { target } => {
                self.handle_kick(sender, &target);
            }
            ClientMessage::Other { raw } => {
                self.broadcast_raw(&raw, Some(sender));
            }
        }
    }

    fn handle_kick(&mut self, requester: &PeerId, target: &PeerId) {
        if *requester != self.host {
            debug!(room = %self.room_id, peer = %requester, "kick from non-host, ignoring");
            return;
        }
        if !self.members.contains_key(target) {
            debug!(room = %self.room_id, %target, "kick target not a member, ignoring");
            return;
        }

        if let Some(conn) = self.members.get(target) {
            let _ = conn.send_event(&ServerEvent::Kicked);
            conn.close();
        }
        self.members.shift_remove(target);
        info!(room = %self.room_id, %target, "peer kicked");

        // A host kicking itself follows the same promotion policy as a
        // leave; the broadcast then carries the new host.
        let promoted = if *target == self.host && !self.members.is_empty() {
            self.promote_earliest();
            Some(self.host.clone())
        } else {
            None
        };

        if !self.members.is_empty() {
            self.broadcast(&ServerEvent::UserLeft {
                user_id: target.clone(),
                host: promoted,
            });
        }
    }

    /// Promotes the earliest-joined surviving member.
    fn promote_earliest(&mut self) {
        if let Some(next) = self.members.keys().next() {
            self.host = next.clone();
            info!(room = %self.room_id, host = %self.host, "host promoted");
        }
    }

    /// Unicast to a single member; silent no-op when the target is
    /// absent or already departed.
    fn unicast_raw(&mut self, target: &PeerId, text: &str) {
        let Some(conn) = self.members.get(target) else {
            debug!(room = %self.room_id, %target, "relay target absent, dropping");
            return;
        };
        if conn.send_raw(text).is_err() {
            self.discard(target.clone());
        }
    }

    fn broadcast(&mut self, event: &ServerEvent) {
        match serde_json::to_string(event) {
            Ok(text) => self.broadcast_raw(&text, None),
            Err(e) => error!(room = %self.room_id, error = %e, "failed to encode event"),
        }
    }

    /// Delivers to every member except `exclude`. A member whose pump
    /// is gone is removed in the same pass without a `user-left`
    /// broadcast; host re-election still applies so the host invariant
    /// never breaks.
    fn broadcast_raw(&mut self, text: &str, exclude: Option<&PeerId>) {
        let mut departed: Vec<PeerId> = Vec::new();
        for (peer, conn) in &self.members {
            if Some(peer) == exclude {
                continue;
            }
            if let Err(SendError::Closed) = conn.send_raw(text) {
                departed.push(peer.clone());
            }
        }
        for peer in departed {
            self.discard(peer);
        }
    }

    /// Removes a peer that is already gone at the transport level.
    fn discard(&mut self, peer: PeerId) {
        if self.members.shift_remove(&peer).is_none() {
            return;
        }
        warn!(room = %self.room_id, %peer, "dropping departed peer");
        if peer == self.host {
            self.promote_earliest();
        }
    }

    fn member_ids(&self) -> Vec<PeerId> {
        self.members.keys().cloned().collect()
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id.clone(),
            members: self.member_ids(),
            host: self.host.clone(),
            locked: self.locked,
        }
    }
}
