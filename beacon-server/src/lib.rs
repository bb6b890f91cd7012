pub mod room;
pub mod signaling;
pub mod transport;

pub use room::{RoomError, RoomHandle, RoomInfo, RoomRegistry};
pub use signaling::{router, ws_handler};
pub use transport::{Outbound, PeerConn, SendError};
