mod human_bytes;
mod url_encode;

pub use human_bytes::human_bytes;
pub use url_encode::url_encode_bytes;

use rand::Rng;

/// Builds an Azureus-style peer ID: `prefix` followed by random decimal
/// digits up to 20 bytes. A prefix longer than 20 bytes is truncated.
pub fn generate_peer_id(prefix: &str) -> [u8; 20] {
	let mut rng = rand::thread_rng();
	let mut peer_id = [0u8; 20];

	let prefix = prefix.as_bytes();
	let fixed = prefix.len().min(peer_id.len());
	peer_id[..fixed].copy_from_slice(&prefix[..fixed]);
	for byte in &mut peer_id[fixed..] {
		*byte = b'0' + rng.gen_range(0..10);
	}
	peer_id
}
