mod event;
mod message;
mod peer;
mod room;

pub use event::ServerEvent;
pub use message::ClientMessage;
pub use peer::PeerId;
pub use room::RoomId;
