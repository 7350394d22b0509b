use thiserror::Error;

/// Failures raised while decoding or encoding bencode.
///
/// Every decode variant carries the byte offset at which the problem was
/// detected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BencodeError {
	#[error("Unexpected end of input at byte {position}")]
	EndOfInput { position: usize },

	#[error("Unexpected token {found:?} at byte {position}")]
	UnexpectedToken { position: usize, found: char },

	#[error("Invalid integer at byte {position}: {reason}")]
	InvalidInteger { position: usize, reason: String },

	#[error("Invalid string length at byte {position}: {reason}")]
	InvalidLength { position: usize, reason: String },

	#[error("Unterminated {kind} starting at byte {position}")]
	Unterminated { position: usize, kind: &'static str },

	#[error("Dictionary key at byte {position} is not a byte string")]
	InvalidKey { position: usize },

	#[error("Value cannot be bencoded: {0}")]
	NotEncodable(String),
}

impl BencodeError {
	/// Byte offset of a decode failure; `None` for encode failures.
	pub fn position(&self) -> Option<usize> {
		match self {
			BencodeError::EndOfInput { position }
			| BencodeError::UnexpectedToken { position, .. }
			| BencodeError::InvalidInteger { position, .. }
			| BencodeError::InvalidLength { position, .. }
			| BencodeError::Unterminated { position, .. }
			| BencodeError::InvalidKey { position } => Some(*position),
			BencodeError::NotEncodable(_) => None,
		}
	}
}
