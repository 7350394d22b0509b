use log::debug;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::peer::error::PeerError;
use crate::peer::message::read_full;

/// Constants for the BitTorrent protocol handshake.
pub const BT_PROTOCOL_STR: &str = "BitTorrent protocol";
pub const BT_PROTOCOL_LEN: u8 = 19;

/// Length of a handshake carrying the standard protocol label.
pub const HANDSHAKE_LEN: usize = 1 + BT_PROTOCOL_LEN as usize + 8 + 20 + 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
	/// Not checked on receipt; peers with an odd label are still accepted.
	/// At most 255 bytes, or `serialize` fails.
	pub protocol: String,
	pub reserved: [u8; 8],
	pub info_hash: [u8; 20],
	pub peer_id: [u8; 20],
}

impl Handshake {
	/// A plain handshake: standard label, no extension bits.
	pub fn new(info_hash: [u8; 20], peer_id: [u8; 20]) -> Self {
		Self {
			protocol: BT_PROTOCOL_STR.to_string(),
			reserved: [0u8; 8],
			info_hash,
			peer_id,
		}
	}

	/// Wire form: `[len][label][reserved:8][info_hash:20][peer_id:20]`, no length prefix.
	///
	/// The label length must fit the one-byte length field.
	pub fn serialize(&self) -> Result<Vec<u8>, PeerError> {
		let label = self.protocol.as_bytes();
		let label_len = u8::try_from(label.len()).map_err(|_| PeerError::MalformedMessage {
			name: "handshake",
			reason: format!("protocol label of {} bytes exceeds 255", label.len()),
		})?;

		let mut buf = Vec::with_capacity(1 + label.len() + 48);
		buf.push(label_len);
		buf.extend_from_slice(label);
		buf.extend_from_slice(&self.reserved);
		buf.extend_from_slice(&self.info_hash);
		buf.extend_from_slice(&self.peer_id);
		Ok(buf)
	}
}

/// Sends the handshake as one contiguous write.
pub async fn send_handshake<S>(stream: &mut S, handshake: &Handshake) -> Result<(), PeerError>
where
	S: AsyncWrite + Unpin,
{
	stream.write_all(&handshake.serialize()?).await?;
	stream.flush().await?;
	Ok(())
}

/// Reads the remote handshake and checks it against what we expect.
///
/// The info hash must match byte for byte. When the tracker told us the
/// peer's id, the id in the handshake must match it too.
pub async fn receive_handshake<S>(
	stream: &mut S,
	expected_info_hash: &[u8; 20],
	expected_peer_id: Option<&[u8; 20]>,
) -> Result<Handshake, PeerError>
where
	S: AsyncRead + Unpin,
{
	let mut len = [0u8; 1];
	if read_full(stream, &mut len).await? == 0 {
		return Err(PeerError::ConnectionClosed);
	}

	// label, reserved, info hash; the peer id is only read once the hash matches
	let label_len = len[0] as usize;
	let mut head = vec![0u8; label_len + 28];
	let received = read_full(stream, &mut head).await?;
	if received < head.len() {
		return Err(PeerError::TruncatedMessage {
			expected: head.len(),
			received,
		});
	}

	let (label, rest) = head.split_at(label_len);
	let (reserved, info_hash) = rest.split_at(8);

	if info_hash != expected_info_hash {
		return Err(PeerError::InfoHashMismatch {
			expected: hex::encode(expected_info_hash),
			received: hex::encode(info_hash),
		});
	}

	let mut peer_id = [0u8; 20];
	let received = read_full(stream, &mut peer_id).await?;
	if received < peer_id.len() {
		return Err(PeerError::TruncatedMessage {
			expected: peer_id.len(),
			received,
		});
	}

	if let Some(expected) = expected_peer_id {
		if &peer_id != expected {
			return Err(PeerError::PeerIdMismatch {
				expected: hex::encode(expected),
				received: hex::encode(peer_id),
			});
		}
	}

	let mut handshake = Handshake::new(*expected_info_hash, [0u8; 20]);
	handshake.protocol = String::from_utf8_lossy(label).into_owned();
	handshake.reserved.copy_from_slice(reserved);
	handshake.peer_id = peer_id;

	debug!("Received handshake from peer {}", String::from_utf8_lossy(&handshake.peer_id));
	Ok(handshake)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tokio::io::AsyncReadExt;

	#[test]
	fn test_serialize_layout() {
		let bytes = Handshake::new([4u8; 20], [5u8; 20]).serialize().unwrap();
		assert_eq!(bytes.len(), HANDSHAKE_LEN);
		assert_eq!(bytes[0], BT_PROTOCOL_LEN);
		assert_eq!(&bytes[1..20], BT_PROTOCOL_STR.as_bytes());
		assert_eq!(&bytes[20..28], &[0u8; 8]);
		assert_eq!(&bytes[28..48], &[4u8; 20]);
		assert_eq!(&bytes[48..68], &[5u8; 20]);
	}

	#[tokio::test]
	async fn test_send_handshake() {
		let info_hash = [4u8; 20];
		let peer_id = [5u8; 20];
		let (mut client, mut server) = tokio::io::duplex(128);

		let server_task = tokio::spawn(async move {
			let mut buf = [0u8; HANDSHAKE_LEN];
			server.read_exact(&mut buf).await.expect("server read failed");
			buf
		});

		send_handshake(&mut client, &Handshake::new(info_hash, peer_id))
			.await
			.expect("send handshake failed");

		let received = server_task.await.unwrap();
		assert_eq!(received.to_vec(), Handshake::new(info_hash, peer_id).serialize().unwrap());
	}

	#[tokio::test]
	async fn test_receive_handshake() {
		let info_hash = [1u8; 20];
		let remote_peer_id = [3u8; 20];
		let (mut client, mut server) = tokio::io::duplex(128);

		let mut remote = Handshake::new(info_hash, remote_peer_id);
		remote.reserved[5] = 0x10;
		server.write_all(&remote.serialize().unwrap()).await.unwrap();

		let received = receive_handshake(&mut client, &info_hash, Some(&remote_peer_id))
			.await
			.expect("handshake validation failed");
		assert_eq!(received, remote);
	}

	#[tokio::test]
	async fn test_receive_handshake_odd_label() {
		let info_hash = [1u8; 20];
		let (mut client, mut server) = tokio::io::duplex(128);

		let mut remote = Handshake::new(info_hash, [3u8; 20]);
		remote.protocol = "Some other protocol v2".to_string();
		server.write_all(&remote.serialize().unwrap()).await.unwrap();

		let received = receive_handshake(&mut client, &info_hash, None).await.unwrap();
		assert_eq!(received.protocol, "Some other protocol v2");
	}

	#[tokio::test]
	async fn test_info_hash_mismatch() {
		let (mut client, mut server) = tokio::io::duplex(128);
		server
			.write_all(&Handshake::new([9u8; 20], [3u8; 20]).serialize().unwrap())
			.await
			.unwrap();

		match receive_handshake(&mut client, &[1u8; 20], None).await {
			Err(PeerError::InfoHashMismatch { expected, received }) => {
				assert_eq!(expected, "01".repeat(20));
				assert_eq!(received, "09".repeat(20));
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_peer_id_mismatch() {
		let info_hash = [1u8; 20];
		let (mut client, mut server) = tokio::io::duplex(128);
		server
			.write_all(&Handshake::new(info_hash, [3u8; 20]).serialize().unwrap())
			.await
			.unwrap();

		assert!(matches!(
			receive_handshake(&mut client, &info_hash, Some(&[4u8; 20])).await,
			Err(PeerError::PeerIdMismatch { .. })
		));
	}

	#[tokio::test]
	async fn test_truncated_handshake() {
		let info_hash = [1u8; 20];
		let (mut client, mut server) = tokio::io::duplex(128);
		let bytes = Handshake::new(info_hash, [3u8; 20]).serialize().unwrap();
		server.write_all(&bytes[..40]).await.unwrap();
		drop(server);

		match receive_handshake(&mut client, &info_hash, None).await {
			Err(PeerError::TruncatedMessage { expected, received }) => {
				assert_eq!(expected, HANDSHAKE_LEN - 21);
				assert_eq!(received, 39);
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_info_hash_checked_before_peer_id_arrives() {
		let (mut client, mut server) = tokio::io::duplex(128);
		let bytes = Handshake::new([9u8; 20], [3u8; 20]).serialize().unwrap();
		server.write_all(&bytes[..48]).await.unwrap();
		drop(server);

		assert!(matches!(
			receive_handshake(&mut client, &[1u8; 20], None).await,
			Err(PeerError::InfoHashMismatch { .. })
		));
	}

	#[tokio::test]
	async fn test_truncated_peer_id() {
		let info_hash = [1u8; 20];
		let (mut client, mut server) = tokio::io::duplex(128);
		let bytes = Handshake::new(info_hash, [3u8; 20]).serialize().unwrap();
		server.write_all(&bytes[..53]).await.unwrap();
		drop(server);

		assert!(matches!(
			receive_handshake(&mut client, &info_hash, None).await,
			Err(PeerError::TruncatedMessage { expected: 20, received: 5 })
		));
	}

	#[test]
	fn test_oversized_label_rejected() {
		let mut handshake = Handshake::new([1u8; 20], [2u8; 20]);
		handshake.protocol = "é".repeat(128);
		assert!(matches!(
			handshake.serialize(),
			Err(PeerError::MalformedMessage { name: "handshake", .. })
		));

		handshake.protocol = "x".repeat(255);
		assert_eq!(handshake.serialize().unwrap()[0], 255);
	}

	#[tokio::test]
	async fn test_closed_before_handshake() {
		let (mut client, server) = tokio::io::duplex(128);
		drop(server);
		assert!(matches!(
			receive_handshake(&mut client, &[1u8; 20], None).await,
			Err(PeerError::ConnectionClosed)
		));
	}
}
