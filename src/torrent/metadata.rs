use std::{collections::BTreeMap, fs, path::Path};

use crate::bencode::{decode_bencode, BValue};
use crate::torrent::error::TorrentError;
use crate::torrent::infohash::calculate_info_hash;

/// A bencoded dictionary as produced by the decoder.
pub type Dict = BTreeMap<Vec<u8>, BValue>;

/// Length of one SHA-1 piece hash.
pub const PIECE_HASH_LEN: usize = 20;

/// Represents a .torrent file: the tracker URL and the info dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Torrent {
	pub announce: String,  // The tracker URL
	pub info: TorrentInfo, // Torrent metadata
}

/// Contains detailed metadata about the torrent's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentInfo {
	pub name: String,              // Name of the file or folder
	pub piece_length: u64,         // Size of each piece
	pub pieces: Vec<[u8; 20]>,     // SHA-1 hashes, in piece-index order
	pub layout: FileLayout,
	/// Keys of the info dictionary this model does not interpret (`private`,
	/// `source`, ...). They are re-encoded with the rest so the info hash
	/// matches the one trackers compute.
	pub extra: Dict,
}

/// Whether the torrent describes one file or a directory of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLayout {
	SingleFile { length: u64 },
	MultiFile { files: Vec<InfoFile> },
}

/// One entry of a multi-file torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoFile {
	pub length: u64,
	/// Path segments, ending with the file name.
	pub path: Vec<String>,
	/// Per-file keys this model does not interpret (`md5sum`, `attr`, ...),
	/// re-encoded with the file entry.
	pub extra: Dict,
}

impl Torrent {
	/// Reads a .torrent file from disk and parses its contents.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TorrentError> {
		let buf = fs::read(path)?;
		Self::from_bytes(&buf)
	}

	/// Parses the first bencoded document in `bytes`; trailing data is ignored.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, TorrentError> {
		let (_consumed, bvalue) = decode_bencode(bytes)?;
		Self::from_bvalue(&bvalue)
	}

	/// Creates a `Torrent` from a decoded metainfo dictionary.
	pub fn from_bvalue(value: &BValue) -> Result<Self, TorrentError> {
		let root_dict = value.as_dict().ok_or_else(|| {
			TorrentError::InvalidMetainfo(format!(
				"root of .torrent must be a dictionary, found {}",
				value.kind()
			))
		})?;

		let announce = get_string(root_dict, "announce")?;
		let info_dict = get_dict(root_dict, "info")?;
		let info = TorrentInfo::from_dict(info_dict)?;

		Ok(Torrent { announce, info })
	}

	pub fn info_hash(&self) -> Result<[u8; 20], TorrentError> {
		self.info.info_hash()
	}
}

impl TorrentInfo {
	pub fn from_dict(info_dict: &Dict) -> Result<Self, TorrentError> {
		let name = get_string(info_dict, "name")?;

		let piece_length = non_negative("piece length", get_integer(info_dict, "piece length")?)?;
		if piece_length == 0 {
			return Err(TorrentError::InvalidMetainfo(
				"'piece length' must be positive".to_string(),
			));
		}

		let pieces = split_piece_hashes(lookup_bytestring(info_dict, "pieces")?)?;

		let layout = match (info_dict.contains_key(&b"length"[..]), info_dict.contains_key(&b"files"[..])) {
			(true, false) => FileLayout::SingleFile {
				length: non_negative("length", get_integer(info_dict, "length")?)?,
			},
			(false, true) => FileLayout::MultiFile {
				files: parse_files(get_list(info_dict, "files")?)?,
			},
			(true, true) => {
				return Err(TorrentError::InvalidMetainfo(
					"info has both 'length' and 'files'".to_string(),
				))
			}
			(false, false) => {
				return Err(TorrentError::InvalidMetainfo(
					"info has neither 'length' nor 'files'".to_string(),
				))
			}
		};

		let extra = info_dict
			.iter()
			.filter(|(key, _)| !is_modelled_key(key))
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect();

		Ok(TorrentInfo {
			name,
			piece_length,
			pieces,
			layout,
			extra,
		})
	}

	/// The SHA-1 digest of each piece, in piece-index order.
	pub fn piece_hashes(&self) -> &[[u8; 20]] {
		&self.pieces
	}

	pub fn piece_count(&self) -> usize {
		self.pieces.len()
	}

	pub fn is_multi_file(&self) -> bool {
		matches!(self.layout, FileLayout::MultiFile { .. })
	}

	pub fn files(&self) -> Option<&[InfoFile]> {
		match &self.layout {
			FileLayout::MultiFile { files } => Some(files),
			FileLayout::SingleFile { .. } => None,
		}
	}

	/// The single file's length, or the sum of every file's length.
	pub fn total_length(&self) -> u64 {
		match &self.layout {
			FileLayout::SingleFile { length } => *length,
			FileLayout::MultiFile { files } => files
				.iter()
				.fold(0u64, |total, f| total.saturating_add(f.length)),
		}
	}

	/// Size of the piece at `index`; the last piece may be shorter than
	/// `piece_length`.
	pub fn piece_size(&self, index: usize) -> Option<u64> {
		if index >= self.piece_count() {
			return None;
		}
		let offset = (index as u64).saturating_mul(self.piece_length);
		Some(self.piece_length.min(self.total_length().saturating_sub(offset)))
	}

	pub fn info_hash(&self) -> Result<[u8; 20], TorrentError> {
		calculate_info_hash(self)
	}
}

/// Splits the concatenated `pieces` string into 20-byte digests.
pub fn split_piece_hashes(bytes: &[u8]) -> Result<Vec<[u8; 20]>, TorrentError> {
	if bytes.len() % PIECE_HASH_LEN != 0 {
		return Err(TorrentError::InvalidMetainfo(format!(
			"'pieces' length {} is not a multiple of {}",
			bytes.len(),
			PIECE_HASH_LEN
		)));
	}

	Ok(bytes
		.chunks_exact(PIECE_HASH_LEN)
		.map(|chunk| {
			let mut hash = [0u8; 20];
			hash.copy_from_slice(chunk);
			hash
		})
		.collect())
}

fn parse_files(items: &[BValue]) -> Result<Vec<InfoFile>, TorrentError> {
	if items.is_empty() {
		return Err(TorrentError::InvalidMetainfo("'files' list is empty".to_string()));
	}

	let files = items
		.iter()
		.map(|item| {
			let file = item.as_dict().ok_or_else(|| missing("files", "list of dictionaries"))?;
			let length = non_negative("length", get_integer(file, "length")?)?;

			let path = get_list(file, "path")?
				.iter()
				.map(|segment| {
					segment
						.as_str()
						.map(str::to_string)
						.ok_or_else(|| missing("path", "list of UTF-8 strings"))
				})
				.collect::<Result<Vec<_>, _>>()?;
			if path.is_empty() {
				return Err(TorrentError::InvalidMetainfo("file with empty 'path'".to_string()));
			}

			let extra = file
				.iter()
				.filter(|(key, _)| !matches!(key.as_slice(), b"length" | b"path"))
				.map(|(key, value)| (key.clone(), value.clone()))
				.collect();

			Ok(InfoFile { length, path, extra })
		})
		.collect::<Result<Vec<_>, TorrentError>>()?;

	// the total must fit a u64 so total_length and piece_size stay exact
	files.iter().try_fold(0u64, |total, f| {
		total.checked_add(f.length).ok_or_else(|| {
			TorrentError::InvalidMetainfo("sum of file lengths overflows 64 bits".to_string())
		})
	})?;

	Ok(files)
}

fn is_modelled_key(key: &[u8]) -> bool {
	matches!(key, b"name" | b"piece length" | b"pieces" | b"length" | b"files")
}

fn missing(key: &str, expected: &'static str) -> TorrentError {
	TorrentError::MissingField {
		field: key.to_string(),
		expected,
	}
}

fn non_negative(key: &str, value: i64) -> Result<u64, TorrentError> {
	u64::try_from(value)
		.map_err(|_| TorrentError::InvalidMetainfo(format!("'{}' must not be negative: {}", key, value)))
}

/// Looks up a key in the dictionary and returns a byte slice if the value is a ByteString.
pub fn lookup_bytestring<'a>(dict: &'a Dict, key: &str) -> Result<&'a [u8], TorrentError> {
	dict.get(key.as_bytes())
		.and_then(BValue::as_bytes)
		.ok_or_else(|| missing(key, "byte string"))
}

/// Gets a ByteString from the dictionary as a UTF-8 String.
pub fn get_string(dict: &Dict, key: &str) -> Result<String, TorrentError> {
	let bytes = lookup_bytestring(dict, key)?;
	String::from_utf8(bytes.to_vec()).map_err(|_| missing(key, "UTF-8 string"))
}

/// Retrieves an integer value from the dictionary.
pub fn get_integer(dict: &Dict, key: &str) -> Result<i64, TorrentError> {
	dict.get(key.as_bytes())
		.and_then(BValue::as_integer)
		.ok_or_else(|| missing(key, "integer"))
}

fn get_dict<'a>(dict: &'a Dict, key: &str) -> Result<&'a Dict, TorrentError> {
	dict.get(key.as_bytes())
		.and_then(BValue::as_dict)
		.ok_or_else(|| missing(key, "dictionary"))
}

fn get_list<'a>(dict: &'a Dict, key: &str) -> Result<&'a [BValue], TorrentError> {
	dict.get(key.as_bytes())
		.and_then(BValue::as_list)
		.ok_or_else(|| missing(key, "list"))
}
