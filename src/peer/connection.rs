use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::peer::bitfield::BitField;
use crate::peer::error::PeerError;
use crate::peer::handshake::{receive_handshake, send_handshake, Handshake};
use crate::peer::message::{read_message, write_message, Message};
use crate::tracker::TrackerPeer;

/// Where a connection is in the handshake sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
	/// No handshake sent yet.
	Unconnected,
	/// Our handshake is out; the peer's has not been accepted.
	HandshakeSent,
	/// The peer's handshake checked out; no message exchanged yet.
	HandshakeValidated,
	/// At least one message has gone either way.
	Established,
}

/// One connection to one peer.
///
/// Owns its stream exclusively. Drive it from a single task; run several
/// connections by creating one `PeerConnection` each.
pub struct PeerConnection<S = TcpStream> {
	stream: S,
	state: ConnectionState,
	info_hash: [u8; 20],
	local_peer_id: [u8; 20],
	/// Id the tracker announced for this peer, checked during the handshake.
	expected_peer_id: Option<[u8; 20]>,
	remote_peer_id: Option<[u8; 20]>,
	remote_bitfield: BitField,
	peer_choking: bool,
	am_interested: bool,
}

impl PeerConnection<TcpStream> {
	/// Opens a TCP connection to `peer`. The handshake is left to the caller.
	pub async fn connect(
		peer: &TrackerPeer,
		info_hash: [u8; 20],
		local_peer_id: [u8; 20],
		piece_count: usize,
	) -> Result<Self, PeerError> {
		let stream = TcpStream::connect((peer.ip.as_str(), peer.port)).await?;
		info!("Connected to peer {}", peer);
		Ok(Self::new(stream, info_hash, local_peer_id, peer.peer_id, piece_count))
	}
}

impl<S> PeerConnection<S>
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	pub fn new(
		stream: S,
		info_hash: [u8; 20],
		local_peer_id: [u8; 20],
		expected_peer_id: Option<[u8; 20]>,
		piece_count: usize,
	) -> Self {
		Self {
			stream,
			state: ConnectionState::Unconnected,
			info_hash,
			local_peer_id,
			expected_peer_id,
			remote_peer_id: None,
			remote_bitfield: BitField::empty(piece_count),
			peer_choking: true,
			am_interested: false,
		}
	}

	/// Sends our handshake and validates the peer's.
	///
	/// Returns the remote peer id. On any failure the connection stays
	/// unusable for messages.
	pub async fn handshake(&mut self) -> Result<[u8; 20], PeerError> {
		if self.state != ConnectionState::Unconnected {
			return Err(PeerError::InvalidState(self.state));
		}

		send_handshake(&mut self.stream, &Handshake::new(self.info_hash, self.local_peer_id)).await?;
		self.state = ConnectionState::HandshakeSent;
		debug!("Handshake sent for {}", hex::encode(self.info_hash));

		let remote = receive_handshake(
			&mut self.stream,
			&self.info_hash,
			self.expected_peer_id.as_ref(),
		)
		.await?;

		self.remote_peer_id = Some(remote.peer_id);
		self.state = ConnectionState::HandshakeValidated;
		info!("Handshake complete, peer id {}", hex::encode(remote.peer_id));
		Ok(remote.peer_id)
	}

	/// Reads the next message and folds it into the connection's view of the peer.
	pub async fn read_message(&mut self) -> Result<Message, PeerError> {
		self.ensure_ready()?;
		let message = read_message(&mut self.stream).await?;
		self.state = ConnectionState::Established;

		match &message {
			Message::Choke => self.peer_choking = true,
			Message::Unchoke => self.peer_choking = false,
			Message::Have { piece_index } => {
				let index = *piece_index as usize;
				if index >= self.remote_bitfield.piece_count() {
					warn!("Peer announced piece {} beyond the piece count", index);
				}
				self.remote_bitfield.set_piece(index);
			}
			Message::Bitfield { bits } => {
				self.remote_bitfield =
					BitField::from_payload(bits.clone(), self.remote_bitfield.piece_count())?;
			}
			_ => {}
		}

		Ok(message)
	}

	pub async fn send_message(&mut self, message: &Message) -> Result<(), PeerError> {
		self.ensure_ready()?;
		write_message(&mut self.stream, message).await?;
		self.state = ConnectionState::Established;

		match message {
			Message::Interested => self.am_interested = true,
			Message::NotInterested => self.am_interested = false,
			_ => {}
		}
		Ok(())
	}

	fn ensure_ready(&self) -> Result<(), PeerError> {
		match self.state {
			ConnectionState::HandshakeValidated | ConnectionState::Established => Ok(()),
			state => Err(PeerError::InvalidState(state)),
		}
	}

	pub fn state(&self) -> ConnectionState {
		self.state
	}

	pub fn remote_peer_id(&self) -> Option<&[u8; 20]> {
		self.remote_peer_id.as_ref()
	}

	pub fn remote_bitfield(&self) -> &BitField {
		&self.remote_bitfield
	}

	/// Peers start out choking us.
	pub fn is_choked(&self) -> bool {
		self.peer_choking
	}

	pub fn is_interested(&self) -> bool {
		self.am_interested
	}
}
