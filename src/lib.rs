// lib.rs - Library interface for the BitTorrent wire toolkit

pub mod bencode;
pub mod config;
pub mod peer;
pub mod torrent;
pub mod tracker;
pub mod utils;

// Re-export commonly used types for easier testing
pub use bencode::{decode, decode_bencode, encode, encode_bvalue, BValue, Bencodable, BencodeError};
pub use config::Config;
pub use peer::{BitField, Handshake, Message, PeerConnection, PeerError};
pub use torrent::{Torrent, TorrentError, TorrentInfo};
pub use tracker::{TrackerError, TrackerPeer, TrackerRequest, TrackerResponse};
