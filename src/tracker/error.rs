use thiserror::Error;

use crate::bencode::BencodeError;
use crate::torrent::TorrentError;

#[derive(Debug, Error)]
pub enum TrackerError {
	#[error("Invalid announce url '{url}': {reason}")]
	InvalidUrl { url: String, reason: String },

	#[error("Unsupported announce scheme '{0}'")]
	UnsupportedScheme(String),

	#[error("Tracker request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("Tracker returned HTTP {0}")]
	HttpStatus(reqwest::StatusCode),

	#[error("Tracker response bencode error: {0}")]
	Bencode(#[from] BencodeError),

	#[error("Tracker failure: {0}")]
	Failure(String),

	#[error("Malformed tracker response: {0}")]
	MalformedResponse(String),

	#[error("Invalid peer entry: {0}")]
	InvalidPeerEntry(String),

	#[error("'peers' is neither a byte string nor a list, found {0}")]
	UnknownPeerListFormat(&'static str),

	#[error("Could not compute info hash: {0}")]
	Torrent(#[from] TorrentError),
}
