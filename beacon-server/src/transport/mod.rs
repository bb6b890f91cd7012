mod peer_conn;

pub use peer_conn::*;
