use thiserror::Error;

use crate::bencode::BencodeError;

#[derive(Debug, Error)]
pub enum TorrentError {
	#[error("I/O error while reading torrent: {0}")]
	Io(#[from] std::io::Error),

	#[error("Bencode error: {0}")]
	Bencode(#[from] BencodeError),

	/// A required key is absent or holds the wrong kind of token.
	#[error("Missing or invalid '{field}' (expected {expected})")]
	MissingField { field: String, expected: &'static str },

	#[error("Invalid metainfo: {0}")]
	InvalidMetainfo(String),
}
