use reqwest::Url;
use serde::Serialize;

use crate::torrent::Torrent;
use crate::tracker::error::TrackerError;
use crate::utils::url_encode_bytes;

/// The `event` announced to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerEvent {
	Started,
	Completed,
	Stopped,
	/// Same as sending no event at all.
	Empty,
}

/// Parameters of an HTTP announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerRequest {
	/// SHA-1 of the bencoded info dictionary.
	pub info_hash: [u8; 20],
	pub peer_id: [u8; 20],
	/// Address to advertise instead of the one the tracker sees.
	pub ip: Option<String>,
	pub port: u16,
	pub uploaded: u64,
	pub downloaded: u64,
	pub left: u64,
	pub event: Option<TrackerEvent>,
	/// Ask for the 6-bytes-per-peer list. Advisory only; trackers may ignore it.
	pub compact: bool,
}

impl TrackerRequest {
	/// A first announce for `torrent`: nothing transferred, everything left.
	pub fn for_torrent(torrent: &Torrent, peer_id: [u8; 20], port: u16) -> Result<Self, TrackerError> {
		Ok(Self {
			info_hash: torrent.info_hash()?,
			peer_id,
			ip: None,
			port,
			uploaded: 0,
			downloaded: 0,
			left: torrent.info.total_length(),
			event: Some(TrackerEvent::Started),
			compact: true,
		})
	}
}

/// The textual query parameters; the two binary ones are encoded by hand.
#[derive(Serialize)]
struct QueryParams<'a> {
	port: u16,
	uploaded: u64,
	downloaded: u64,
	left: u64,
	compact: u8,
	#[serde(skip_serializing_if = "Option::is_none")]
	ip: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	event: Option<TrackerEvent>,
}

/// Builds the GET url for an announce. Any query already present on the
/// announce url (a passkey, for instance) is kept in front of ours.
pub fn build_announce_url(announce: &str, request: &TrackerRequest) -> Result<Url, TrackerError> {
	let invalid = |reason: String| TrackerError::InvalidUrl {
		url: announce.to_string(),
		reason,
	};

	let mut url = Url::parse(announce).map_err(|e| invalid(e.to_string()))?;
	match url.scheme() {
		"http" | "https" => {}
		other => return Err(TrackerError::UnsupportedScheme(other.to_string())),
	}

	let params = serde_urlencoded::to_string(QueryParams {
		port: request.port,
		uploaded: request.uploaded,
		downloaded: request.downloaded,
		left: request.left,
		compact: u8::from(request.compact),
		ip: request.ip.as_deref(),
		event: request.event,
	})
	.map_err(|e| invalid(e.to_string()))?;

	let mut query = url.query().unwrap_or_default().to_string();
	if !query.is_empty() {
		query.push('&');
	}
	query.push_str(&format!(
		"info_hash={}&peer_id={}&{}",
		url_encode_bytes(&request.info_hash),
		url_encode_bytes(&request.peer_id),
		params
	));
	url.set_query(Some(&query));

	Ok(url)
}
