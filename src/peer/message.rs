use bytes::{Buf, BufMut, BytesMut};
use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::peer::error::PeerError;

/// Frames above this size are refused before any payload is read.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub const CHOKE: u8 = 0;
pub const UNCHOKE: u8 = 1;
pub const INTERESTED: u8 = 2;
pub const NOT_INTERESTED: u8 = 3;
pub const HAVE: u8 = 4;
pub const BITFIELD: u8 = 5;
pub const REQUEST: u8 = 6;
pub const PIECE: u8 = 7;
pub const CANCEL: u8 = 8;

/// The wire messages exchanged after the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
	/// Zero-length frame, no id byte.
	KeepAlive,
	Choke,
	Unchoke,
	Interested,
	NotInterested,
	Have { piece_index: u32 },
	Bitfield { bits: Vec<u8> },
	Request { index: u32, begin: u32, length: u32 },
	Piece { index: u32, begin: u32, block: Vec<u8> },
	Cancel { index: u32, begin: u32, length: u32 },
	/// Any id we do not interpret. Received only; it cannot be sent.
	Generic { id: u8, payload: Vec<u8> },
}

impl Message {
	/// The id byte, `None` for a keep-alive.
	pub fn id(&self) -> Option<u8> {
		match self {
			Message::KeepAlive => None,
			Message::Choke => Some(CHOKE),
			Message::Unchoke => Some(UNCHOKE),
			Message::Interested => Some(INTERESTED),
			Message::NotInterested => Some(NOT_INTERESTED),
			Message::Have { .. } => Some(HAVE),
			Message::Bitfield { .. } => Some(BITFIELD),
			Message::Request { .. } => Some(REQUEST),
			Message::Piece { .. } => Some(PIECE),
			Message::Cancel { .. } => Some(CANCEL),
			Message::Generic { id, .. } => Some(*id),
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			Message::KeepAlive => "keep-alive",
			Message::Choke => "choke",
			Message::Unchoke => "unchoke",
			Message::Interested => "interested",
			Message::NotInterested => "not interested",
			Message::Have { .. } => "have",
			Message::Bitfield { .. } => "bitfield",
			Message::Request { .. } => "request",
			Message::Piece { .. } => "piece",
			Message::Cancel { .. } => "cancel",
			Message::Generic { .. } => "generic",
		}
	}

	/// Encodes the full frame, length prefix included.
	pub fn encode(&self) -> Result<Vec<u8>, PeerError> {
		let mut body = BytesMut::new();

		match self {
			Message::KeepAlive => {}
			Message::Choke | Message::Unchoke | Message::Interested | Message::NotInterested => {
				body.put_u8(self.id().unwrap_or_default());
			}
			Message::Have { piece_index } => {
				body.put_u8(HAVE);
				body.put_u32(*piece_index);
			}
			Message::Bitfield { bits } => {
				body.put_u8(BITFIELD);
				body.put_slice(bits);
			}
			Message::Request { index, begin, length } | Message::Cancel { index, begin, length } => {
				body.put_u8(self.id().unwrap_or_default());
				body.put_u32(*index);
				body.put_u32(*begin);
				body.put_u32(*length);
			}
			Message::Piece { index, begin, block } => {
				body.put_u8(PIECE);
				body.put_u32(*index);
				body.put_u32(*begin);
				body.put_slice(block);
			}
			Message::Generic { id, .. } => return Err(PeerError::UnsupportedMessageType(*id)),
		}

		if body.len() > MAX_FRAME_LEN {
			return Err(PeerError::FrameTooLarge(body.len()));
		}

		let mut frame = BytesMut::with_capacity(4 + body.len());
		frame.put_u32(body.len() as u32);
		frame.put_slice(&body);
		Ok(frame.to_vec())
	}

	/// Decodes a frame body, i.e. everything after the length prefix.
	pub fn decode(payload: &[u8]) -> Result<Message, PeerError> {
		let mut buf = payload;
		if !buf.has_remaining() {
			return Ok(Message::KeepAlive);
		}

		let id = buf.get_u8();
		let message = match id {
			CHOKE => expect_len(buf, 0, "choke").map(|_| Message::Choke)?,
			UNCHOKE => expect_len(buf, 0, "unchoke").map(|_| Message::Unchoke)?,
			INTERESTED => expect_len(buf, 0, "interested").map(|_| Message::Interested)?,
			NOT_INTERESTED => expect_len(buf, 0, "not interested").map(|_| Message::NotInterested)?,
			HAVE => {
				expect_len(buf, 4, "have")?;
				Message::Have {
					piece_index: buf.get_u32(),
				}
			}
			BITFIELD => Message::Bitfield { bits: buf.to_vec() },
			REQUEST | CANCEL => {
				let name = if id == REQUEST { "request" } else { "cancel" };
				expect_len(buf, 12, name)?;
				let (index, begin, length) = (buf.get_u32(), buf.get_u32(), buf.get_u32());
				if id == REQUEST {
					Message::Request { index, begin, length }
				} else {
					Message::Cancel { index, begin, length }
				}
			}
			PIECE => {
				if buf.remaining() < 8 {
					return Err(PeerError::MalformedMessage {
						name: "piece",
						reason: format!("payload of {} bytes is shorter than its 8-byte header", buf.remaining()),
					});
				}
				let index = buf.get_u32();
				let begin = buf.get_u32();
				Message::Piece {
					index,
					begin,
					block: buf.to_vec(),
				}
			}
			other => Message::Generic {
				id: other,
				payload: buf.to_vec(),
			},
		};

		Ok(message)
	}
}

fn expect_len(buf: &[u8], expected: usize, name: &'static str) -> Result<(), PeerError> {
	if buf.len() != expected {
		return Err(PeerError::MalformedMessage {
			name,
			reason: format!("expected {} payload bytes, got {}", expected, buf.len()),
		});
	}
	Ok(())
}

/// Reads until `buf` is full or the stream ends; returns how many bytes arrived.
pub(crate) async fn read_full<S>(stream: &mut S, buf: &mut [u8]) -> Result<usize, PeerError>
where
	S: AsyncRead + Unpin,
{
	let mut filled = 0;
	while filled < buf.len() {
		let n = stream.read(&mut buf[filled..]).await?;
		if n == 0 {
			break;
		}
		filled += n;
	}
	Ok(filled)
}

/// Reads one length-prefixed frame and decodes it.
pub async fn read_message<S>(stream: &mut S) -> Result<Message, PeerError>
where
	S: AsyncRead + Unpin,
{
	let mut len_buf = [0u8; 4];
	match read_full(stream, &mut len_buf).await? {
		0 => return Err(PeerError::ConnectionClosed),
		4 => {}
		received => return Err(PeerError::TruncatedMessage { expected: 4, received }),
	}

	let length = u32::from_be_bytes(len_buf) as usize;
	if length > MAX_FRAME_LEN {
		return Err(PeerError::FrameTooLarge(length));
	}

	let mut msg_buf = vec![0u8; length];
	let received = read_full(stream, &mut msg_buf).await?;
	if received < length {
		return Err(PeerError::TruncatedMessage {
			expected: length,
			received,
		});
	}

	let message = Message::decode(&msg_buf)?;
	debug!("Received {} message ({} bytes)", message.name(), length);
	Ok(message)
}

/// Encodes and writes one frame.
pub async fn write_message<S>(stream: &mut S, message: &Message) -> Result<(), PeerError>
where
	S: AsyncWrite + Unpin,
{
	let frame = message.encode()?;
	stream.write_all(&frame).await?;
	stream.flush().await?;
	debug!("Sent {} message", message.name());
	Ok(())
}
