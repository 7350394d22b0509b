// infohash.rs
use sha1::{Digest, Sha1};

use crate::bencode::{encode_bvalue, BValue, Bencodable, BencodeError};
use crate::torrent::error::TorrentError;
use crate::torrent::metadata::{FileLayout, InfoFile, TorrentInfo};

/// SHA-1 of the canonical re-encoding of the info dictionary.
///
/// The dictionary is rebuilt from the parsed model rather than hashed from
/// the original file bytes, so key order in the source file does not matter.
pub fn calculate_info_hash(info: &TorrentInfo) -> Result<[u8; 20], TorrentError> {
	let info_bval = info.to_bvalue()?;
	let encoded = encode_bvalue(&info_bval);

	let mut hasher = Sha1::new();
	hasher.update(&encoded);
	let result = hasher.finalize();

	let mut hash_bytes = [0u8; 20];
	hash_bytes.copy_from_slice(&result);
	Ok(hash_bytes)
}

impl Bencodable for InfoFile {
	fn to_bvalue(&self) -> Result<BValue, BencodeError> {
		let mut map = self.extra.clone();
		map.insert(b"length".to_vec(), self.length.to_bvalue()?);
		map.insert(b"path".to_vec(), self.path.to_bvalue()?);
		Ok(BValue::Dict(map))
	}
}

// turning `TorrentInfo` back into the info dictionary
impl Bencodable for TorrentInfo {
	fn to_bvalue(&self) -> Result<BValue, BencodeError> {
		let mut map = self.extra.clone();

		map.insert(b"name".to_vec(), self.name.to_bvalue()?);
		map.insert(b"piece length".to_vec(), self.piece_length.to_bvalue()?);
		map.insert(b"pieces".to_vec(), BValue::ByteString(self.pieces.concat()));

		match &self.layout {
			FileLayout::SingleFile { length } => {
				map.insert(b"length".to_vec(), length.to_bvalue()?);
			}
			FileLayout::MultiFile { files } => {
				map.insert(b"files".to_vec(), files.to_bvalue()?);
			}
		}

		Ok(BValue::Dict(map))
	}
}
