pub mod bitfield;
pub mod connection;
pub mod error;
pub mod handshake;
pub mod message;

pub use bitfield::BitField;
pub use connection::{ConnectionState, PeerConnection};
pub use error::PeerError;
pub use handshake::{receive_handshake, send_handshake, Handshake, BT_PROTOCOL_LEN, BT_PROTOCOL_STR};
pub use message::{read_message, write_message, Message, MAX_FRAME_LEN};
