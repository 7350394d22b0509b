use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::Ipv4Addr;

use log::warn;

use crate::bencode::{decode_bencode, BValue};
use crate::tracker::error::TrackerError;

/// Bytes per peer in the compact peer list: 4 for the IPv4 address, 2 for the port.
pub const COMPACT_PEER_LEN: usize = 6;

/// A peer returned by the tracker.
///
/// Two peers are the same peer when they share an address and port; the
/// peer ID does not take part in comparisons.
#[derive(Debug, Clone, Eq)]
pub struct TrackerPeer {
	pub ip: String,
	pub port: u16,
	/// Absent in the compact format.
	pub peer_id: Option<[u8; 20]>,
}

impl TrackerPeer {
	pub fn new(ip: impl Into<String>, port: u16) -> Self {
		Self {
			ip: ip.into(),
			port,
			peer_id: None,
		}
	}
}

impl PartialEq for TrackerPeer {
	fn eq(&self, other: &Self) -> bool {
		self.ip == other.ip && self.port == other.port
	}
}

impl Hash for TrackerPeer {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.ip.hash(state);
		self.port.hash(state);
	}
}

impl fmt::Display for TrackerPeer {
	/// `host:port`, with IPv6 literals in brackets.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.ip.contains(':') {
			write!(f, "[{}]:{}", self.ip, self.port)
		} else {
			write!(f, "{}:{}", self.ip, self.port)
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerResponse {
	/// Seconds the tracker asks us to wait before announcing again.
	pub interval: u64,
	pub peers: Vec<TrackerPeer>,
}

/// Interprets the body of an announce response.
///
/// A `failure reason` key wins over everything else in the dictionary.
pub fn parse_announce_response(body: &[u8]) -> Result<TrackerResponse, TrackerError> {
	let (_len, bvalue) = decode_bencode(body)?;
	let dict = bvalue.as_dict().ok_or_else(|| {
		TrackerError::MalformedResponse(format!("expected a dictionary, found {}", bvalue.kind()))
	})?;

	if let Some(reason) = dict.get(&b"failure reason"[..]) {
		let message = match reason.as_bytes() {
			Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
			None => format!("<{}>", reason.kind()),
		};
		return Err(TrackerError::Failure(message));
	}

	let interval = dict
		.get(&b"interval"[..])
		.and_then(BValue::as_integer)
		.ok_or_else(|| TrackerError::MalformedResponse("missing integer 'interval'".to_string()))?;
	let interval = u64::try_from(interval)
		.map_err(|_| TrackerError::MalformedResponse(format!("negative interval {}", interval)))?;

	let peers = dict
		.get(&b"peers"[..])
		.ok_or_else(|| TrackerError::MalformedResponse("missing 'peers'".to_string()))?;

	Ok(TrackerResponse {
		interval,
		peers: decode_peer_list(peers)?,
	})
}

/// Decodes either peer list format: a list of dictionaries, or a compact byte string.
pub fn decode_peer_list(peers: &BValue) -> Result<Vec<TrackerPeer>, TrackerError> {
	match peers {
		BValue::ByteString(bytes) => Ok(decode_compact_peers(bytes)),
		BValue::List(list) => list.iter().enumerate().map(decode_peer_entry).collect(),
		other => Err(TrackerError::UnknownPeerListFormat(other.kind())),
	}
}

/// Compact mode: each peer is 6 bytes, [IP(4), Port(2)], both big-endian.
/// A trailing partial entry is dropped.
pub fn decode_compact_peers(bytes: &[u8]) -> Vec<TrackerPeer> {
	let chunks = bytes.chunks_exact(COMPACT_PEER_LEN);
	if !chunks.remainder().is_empty() {
		warn!(
			"Dropping {} trailing bytes of compact peer list",
			chunks.remainder().len()
		);
	}

	chunks
		.map(|chunk| {
			let ip = Ipv4Addr::new(chunk[0], chunk[1], chunk[2], chunk[3]);
			let port = u16::from_be_bytes([chunk[4], chunk[5]]);
			TrackerPeer::new(ip.to_string(), port)
		})
		.collect()
}

fn decode_peer_entry((index, item): (usize, &BValue)) -> Result<TrackerPeer, TrackerError> {
	let invalid = |what: &str| TrackerError::InvalidPeerEntry(format!("peer {}: {}", index, what));

	if item.as_dict().is_none() {
		return Err(invalid("not a dictionary"));
	}

	let ip = item
		.get("ip")
		.and_then(BValue::as_str)
		.ok_or_else(|| invalid("missing string 'ip'"))?;

	let port = item
		.get("port")
		.and_then(BValue::as_integer)
		.ok_or_else(|| invalid("missing integer 'port'"))?;
	let port = u16::try_from(port).map_err(|_| invalid("port out of range"))?;

	let peer_id: [u8; 20] = item
		.get("peer id")
		.and_then(BValue::as_bytes)
		.ok_or_else(|| invalid("missing string 'peer id'"))?
		.try_into()
		.map_err(|_| invalid("'peer id' is not 20 bytes"))?;

	Ok(TrackerPeer {
		ip: ip.to_string(),
		port,
		peer_id: Some(peer_id),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	#[test]
	fn test_decode_compact_single_peer() {
		let peers = decode_compact_peers(&[0x7F, 0x00, 0x00, 0x01, 0x1A, 0xE1]);
		assert_eq!(peers.len(), 1);
		assert_eq!(peers[0].ip, "127.0.0.1");
		assert_eq!(peers[0].port, 6881);
		assert_eq!(peers[0].peer_id, None);
	}

	#[test]
	fn test_decode_compact_drops_partial_entry() {
		let mut bytes = vec![192, 168, 1, 1, 0x1A, 0xE1, 10, 0, 0, 7, 0x00, 0x50];
		bytes.push(0xff);
		let peers = decode_compact_peers(&bytes);
		assert_eq!(peers.len(), 2);
		assert_eq!(peers[1].to_string(), "10.0.0.7:80");
	}

	#[test]
	fn test_parse_compact_response() {
		let mut body = b"d8:intervali900e5:peers6:".to_vec();
		body.extend_from_slice(&[0x7F, 0, 0, 1, 0x1A, 0xE1]);
		body.push(b'e');

		let response = parse_announce_response(&body).unwrap();
		assert_eq!(response.interval, 900);
		assert_eq!(response.peers, vec![TrackerPeer::new("127.0.0.1", 6881)]);
	}

	#[test]
	fn test_parse_dictionary_peer_list() {
		let body = b"d8:intervali1800e5:peersld2:ip9:10.0.0.107:peer id20:-AB1234-0123456789014:porti51413eeee";
		let response = parse_announce_response(body).unwrap();
		assert_eq!(response.interval, 1800);
		assert_eq!(response.peers.len(), 1);
		assert_eq!(response.peers[0].ip, "10.0.0.10");
		assert_eq!(response.peers[0].port, 51413);
		assert_eq!(response.peers[0].peer_id, Some(*b"-AB1234-012345678901"));
	}

	#[test]
	fn test_failure_reason_takes_priority() {
		let body = b"d14:failure reason12:unregistered8:intervali900e5:peers0:e";
		match parse_announce_response(body) {
			Err(TrackerError::Failure(message)) => assert_eq!(message, "unregistered"),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn test_invalid_peer_entry() {
		// missing peer id
		let body = b"d8:intervali1e5:peersld2:ip3:a.b4:porti1eeee";
		assert!(matches!(
			parse_announce_response(body),
			Err(TrackerError::InvalidPeerEntry(_))
		));

		// port out of range
		let body = b"d8:intervali1e5:peersld2:ip3:a.b7:peer id20:aaaaaaaaaaaaaaaaaaaa4:porti70000eeee";
		assert!(matches!(
			parse_announce_response(body),
			Err(TrackerError::InvalidPeerEntry(_))
		));

		// element is not a dictionary
		let body = b"d8:intervali1e5:peersli5eee";
		assert!(matches!(
			parse_announce_response(body),
			Err(TrackerError::InvalidPeerEntry(_))
		));
	}

	#[test]
	fn test_unknown_peer_list_format() {
		let body = b"d8:intervali1e5:peersi5ee";
		assert!(matches!(
			parse_announce_response(body),
			Err(TrackerError::UnknownPeerListFormat("integer"))
		));
	}

	#[test]
	fn test_malformed_responses() {
		assert!(matches!(
			parse_announce_response(b"l4:spame"),
			Err(TrackerError::MalformedResponse(_))
		));
		assert!(matches!(
			parse_announce_response(b"d5:peers0:e"),
			Err(TrackerError::MalformedResponse(_))
		));
		assert!(matches!(
			parse_announce_response(b"<html>"),
			Err(TrackerError::Bencode(_))
		));
	}

	#[test]
	fn test_peer_identity_ignores_peer_id() {
		let mut with_id = TrackerPeer::new("10.0.0.1", 6881);
		with_id.peer_id = Some([1; 20]);
		let without_id = TrackerPeer::new("10.0.0.1", 6881);
		assert_eq!(with_id, without_id);

		let set: HashSet<_> = vec![with_id, without_id, TrackerPeer::new("10.0.0.1", 6882)]
			.into_iter()
			.collect();
		assert_eq!(set.len(), 2);
	}

	#[test]
	fn test_display_ipv6() {
		assert_eq!(TrackerPeer::new("::1", 6881).to_string(), "[::1]:6881");
	}
}
