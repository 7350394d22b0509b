use thiserror::Error;

use crate::peer::connection::ConnectionState;

/// Errors that can occur during peer communication.
#[derive(Debug, Error)]
pub enum PeerError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Connection closed by peer")]
	ConnectionClosed,

	/// The peer answered for a different torrent.
	#[error("Info hash mismatch: expected {expected}, got {received}")]
	InfoHashMismatch { expected: String, received: String },

	/// The peer is not the one the tracker announced.
	#[error("Peer id mismatch: expected {expected}, got {received}")]
	PeerIdMismatch { expected: String, received: String },

	#[error("Truncated message: expected {expected} bytes, got {received}")]
	TruncatedMessage { expected: usize, received: usize },

	#[error("Frame of {0} bytes exceeds the maximum frame size")]
	FrameTooLarge(usize),

	#[error("Malformed {name} message: {reason}")]
	MalformedMessage { name: &'static str, reason: String },

	#[error("Message type {0} cannot be sent")]
	UnsupportedMessageType(u8),

	#[error("Invalid bitfield: {0}")]
	InvalidBitfield(String),

	#[error("Operation not allowed in state {0:?}")]
	InvalidState(ConnectionState),
}
