use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use reqwest::Client;
use tokio::time::timeout;

use rusbit_wire::bencode::{bvalue_to_json, decode_bencode};
use rusbit_wire::config::Config;
use rusbit_wire::peer::{PeerConnection, PeerError};
use rusbit_wire::torrent::Torrent;
use rusbit_wire::tracker::{self, TrackerPeer, TrackerRequest};
use rusbit_wire::utils::{generate_peer_id, human_bytes};

use crate::{Cli, Command};

#[tokio::main]
pub async fn use_command(cli: Cli) -> Result<()> {
	let config = Config::load(&cli.config)
		.map_err(|e| anyhow!("loading config {}: {}", cli.config.display(), e))?;
	debug!("Using {:?}", config);

	match cli.command {
		Command::Decode { value } => {
			let (_consumed, value) =
				decode_bencode(value.as_bytes()).context("decoding bencoded value")?;
			println!("{}", serde_json::to_string(&bvalue_to_json(&value))?);
		}
		Command::Info { file } => {
			let torrent = load_torrent(&file)?;
			let info = &torrent.info;

			println!("Tracker URL: {}", torrent.announce);
			println!("Info Hash: {}", hex::encode(torrent.info_hash()?));
			println!("Name: {}", info.name);
			println!(
				"Length: {} ({} bytes)",
				human_bytes(info.total_length()),
				info.total_length()
			);
			println!("Piece Length: {}", human_bytes(info.piece_length));
			println!("Number of Pieces: {}", info.piece_count());
			if let Some(files) = info.files() {
				println!("Files:");
				for file in files {
					println!("  {} ({})", file.path.join("/"), human_bytes(file.length));
				}
			}
		}
		Command::Pieces { file } => {
			let torrent = load_torrent(&file)?;
			for piece_hash in torrent.info.piece_hashes() {
				println!("{}", hex::encode(piece_hash));
			}
		}
		Command::Peers { file } => {
			let torrent = load_torrent(&file)?;
			for peer in discover_peers(&torrent, &config).await? {
				println!("{}", peer);
			}
		}
		Command::Handshake { file, peer } => {
			let torrent = load_torrent(&file)?;
			let peer = parse_peer(&peer)?;
			let info_hash = torrent.info_hash()?;
			let peer_id = generate_peer_id(&config.peer_id_prefix);

			let remote_id = timeout(config.connect_timeout(), async {
				let mut conn =
					PeerConnection::connect(&peer, info_hash, peer_id, torrent.info.piece_count())
						.await?;
				Ok::<_, PeerError>(conn.handshake().await?)
			})
			.await
			.map_err(|_| anyhow!("handshake with {} timed out", peer))?
			.with_context(|| format!("handshake with {}", peer))?;

			println!("Peer ID: {}", hex::encode(remote_id));
		}
	}

	Ok(())
}

fn load_torrent(path: &Path) -> Result<Torrent> {
	Torrent::from_file(path).with_context(|| format!("reading torrent {}", path.display()))
}

async fn discover_peers(torrent: &Torrent, config: &Config) -> Result<Vec<TrackerPeer>> {
	let client = Client::builder().timeout(config.tracker_timeout()).build()?;
	let peer_id = generate_peer_id(&config.peer_id_prefix);

	let mut request = TrackerRequest::for_torrent(torrent, peer_id, config.listen_port)?;
	request.compact = config.compact;

	let response = tracker::announce(&client, torrent, &request)
		.await
		.with_context(|| format!("announcing to {}", torrent.announce))?;
	info!("Got {} peers from {}", response.peers.len(), torrent.announce);
	Ok(response.peers)
}

/// Accepts `host:port` and `[v6]:port`.
fn parse_peer(addr: &str) -> Result<TrackerPeer> {
	let Some((host, port)) = addr.rsplit_once(':') else {
		bail!("peer address '{}' is not ip:port", addr);
	};
	let host = host.trim_start_matches('[').trim_end_matches(']');
	if host.is_empty() {
		bail!("peer address '{}' has no host", addr);
	}
	let port: u16 = port
		.parse()
		.with_context(|| format!("invalid port in peer address '{}'", addr))?;
	Ok(TrackerPeer::new(host, port))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_peer() {
		assert_eq!(parse_peer("127.0.0.1:6881").unwrap(), TrackerPeer::new("127.0.0.1", 6881));
		assert_eq!(parse_peer("[::1]:51413").unwrap(), TrackerPeer::new("::1", 51413));
		assert!(parse_peer("127.0.0.1").is_err());
		assert!(parse_peer("127.0.0.1:99999").is_err());
		assert!(parse_peer(":6881").is_err());
	}
}
