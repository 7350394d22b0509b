use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Value};

use super::error::BencodeError;
use super::BValue;

/// Encode a `BValue` into its canonical bencoded form.
///
/// Dictionary entries come out in ascending raw-byte key order, so two
/// dictionaries holding the same entries always encode identically.
pub fn encode_bvalue(value: &BValue) -> Vec<u8> {
	let mut out: Vec<u8> = Vec::new();
	write_bvalue(value, &mut out);
	out
}

fn write_bvalue(value: &BValue, out: &mut Vec<u8>) {
	match value {
		BValue::Integer(i) => {
			out.push(b'i');
			out.extend_from_slice(i.to_string().as_bytes());
			out.push(b'e');
		}
		BValue::ByteString(bytes) => write_bytes(bytes, out),
		BValue::List(items) => {
			out.push(b'l');
			for item in items {
				write_bvalue(item, out);
			}
			out.push(b'e');
		}
		BValue::Dict(dict) => {
			out.push(b'd');
			// BTreeMap iterates in ascending byte order already
			for (key, val) in dict {
				write_bytes(key, out);
				write_bvalue(val, out);
			}
			out.push(b'e');
		}
	}
}

fn write_bytes(bytes: &[u8], out: &mut Vec<u8>) {
	out.extend_from_slice(bytes.len().to_string().as_bytes());
	out.push(b':');
	out.extend_from_slice(bytes);
}

/// Types that have a bencode representation.
///
/// Conversion is fallible: bencode has no floats, booleans or nulls, and this
/// implementation only carries 64-bit signed integers.
pub trait Bencodable {
	fn to_bvalue(&self) -> Result<BValue, BencodeError>;
}

/// Encode any `Bencodable` value.
pub fn encode<T: Bencodable + ?Sized>(value: &T) -> Result<Vec<u8>, BencodeError> {
	Ok(encode_bvalue(&value.to_bvalue()?))
}

impl Bencodable for BValue {
	fn to_bvalue(&self) -> Result<BValue, BencodeError> {
		Ok(self.clone())
	}
}

impl Bencodable for str {
	fn to_bvalue(&self) -> Result<BValue, BencodeError> {
		Ok(BValue::ByteString(self.as_bytes().to_vec()))
	}
}

impl Bencodable for String {
	fn to_bvalue(&self) -> Result<BValue, BencodeError> {
		self.as_str().to_bvalue()
	}
}

impl Bencodable for [u8] {
	fn to_bvalue(&self) -> Result<BValue, BencodeError> {
		Ok(BValue::ByteString(self.to_vec()))
	}
}

impl<T: Bencodable + ?Sized> Bencodable for &T {
	fn to_bvalue(&self) -> Result<BValue, BencodeError> {
		(**self).to_bvalue()
	}
}

macro_rules! bencodable_signed {
	($($t:ty),*) => {$(
		impl Bencodable for $t {
			fn to_bvalue(&self) -> Result<BValue, BencodeError> {
				Ok(BValue::Integer(i64::from(*self)))
			}
		}
	)*};
}

macro_rules! bencodable_unsigned {
	($($t:ty),*) => {$(
		impl Bencodable for $t {
			fn to_bvalue(&self) -> Result<BValue, BencodeError> {
				i64::try_from(*self).map(BValue::Integer).map_err(|_| {
					BencodeError::NotEncodable(format!(
						"{} exceeds the 64-bit signed integer range",
						self
					))
				})
			}
		}
	)*};
}

bencodable_signed!(i8, i16, i32, i64);
bencodable_unsigned!(u16, u32, u64, usize);

// `u8` is deliberately not `Bencodable`: byte buffers are strings, not lists.
impl<T: Bencodable> Bencodable for Vec<T> {
	fn to_bvalue(&self) -> Result<BValue, BencodeError> {
		self.iter()
			.map(Bencodable::to_bvalue)
			.collect::<Result<Vec<_>, _>>()
			.map(BValue::List)
	}
}

impl<K: AsRef<[u8]>, V: Bencodable> Bencodable for BTreeMap<K, V> {
	fn to_bvalue(&self) -> Result<BValue, BencodeError> {
		dict_from_entries(self.iter())
	}
}

impl<K: AsRef<[u8]>, V: Bencodable> Bencodable for HashMap<K, V> {
	fn to_bvalue(&self) -> Result<BValue, BencodeError> {
		dict_from_entries(self.iter())
	}
}

fn dict_from_entries<'a, K, V, I>(entries: I) -> Result<BValue, BencodeError>
where
	K: AsRef<[u8]> + 'a,
	V: Bencodable + 'a,
	I: Iterator<Item = (&'a K, &'a V)>,
{
	let mut map = BTreeMap::new();
	for (key, value) in entries {
		map.insert(key.as_ref().to_vec(), value.to_bvalue()?);
	}
	Ok(BValue::Dict(map))
}

/// Convert a `BValue` into JSON (using Serde JSON `Value`).
///
/// - `Integer(i)` => JSON number
/// - `ByteString(bytes)` => Attempt UTF-8; if invalid, store hex in `\"_bytes_hex\"`.
/// - `List(...)` => JSON array
/// - `Dict(...)` => JSON object (keys decoded lossily)
pub fn bvalue_to_json(bv: &BValue) -> Value {
	match bv {
		BValue::Integer(i) => json!(i),
		BValue::ByteString(bytes) => match std::str::from_utf8(bytes) {
			Ok(text) => Value::String(text.to_string()),
			Err(_) => json!({ "_bytes_hex": hex::encode(bytes) }),
		},
		BValue::List(items) => Value::Array(items.iter().map(bvalue_to_json).collect()),
		BValue::Dict(map) => {
			let mut json_map = serde_json::Map::new();
			for (k, v) in map {
				json_map.insert(String::from_utf8_lossy(k).into_owned(), bvalue_to_json(v));
			}
			Value::Object(json_map)
		}
	}
}
