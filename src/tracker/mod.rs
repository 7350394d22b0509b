pub mod error;
pub mod request;
pub mod response;

pub use error::TrackerError;
pub use request::{build_announce_url, TrackerEvent, TrackerRequest};
pub use response::{
	decode_compact_peers, decode_peer_list, parse_announce_response, TrackerPeer, TrackerResponse,
};

use log::{debug, info};
use reqwest::Client;

use crate::torrent::Torrent;

/// Announces to the torrent's tracker and returns its peer list.
///
/// One request, no retries: a failure of any kind is returned to the caller.
pub async fn announce(
	client: &Client,
	torrent: &Torrent,
	request: &TrackerRequest,
) -> Result<TrackerResponse, TrackerError> {
	let url = build_announce_url(&torrent.announce, request)?;
	debug!("Announcing to {}", url);

	let response = client.get(url).send().await?;
	let status = response.status();
	if !status.is_success() {
		return Err(TrackerError::HttpStatus(status));
	}

	let body = response.bytes().await?;
	let parsed = parse_announce_response(&body)?;

	info!(
		"Tracker returned {} peers, re-announce in {}s",
		parsed.peers.len(),
		parsed.interval
	);
	Ok(parsed)
}
