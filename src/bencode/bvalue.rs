use std::collections::BTreeMap;

/// A decoded bencode token.
///
/// Dictionary keys are raw bytes; `BTreeMap` keeps them in ascending byte
/// order, which is the order the canonical encoding requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BValue {
	ByteString(Vec<u8>), // raw bytes, not necessarily UTF-8
	Integer(i64),
	List(Vec<BValue>),
	Dict(BTreeMap<Vec<u8>, BValue>),
}

impl BValue {
	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			BValue::ByteString(bytes) => Some(bytes),
			_ => None,
		}
	}

	/// The byte string as UTF-8 text, if it is both.
	pub fn as_str(&self) -> Option<&str> {
		self.as_bytes().and_then(|bytes| std::str::from_utf8(bytes).ok())
	}

	pub fn as_integer(&self) -> Option<i64> {
		match self {
			BValue::Integer(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[BValue]> {
		match self {
			BValue::List(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_dict(&self) -> Option<&BTreeMap<Vec<u8>, BValue>> {
		match self {
			BValue::Dict(map) => Some(map),
			_ => None,
		}
	}

	/// Looks up `key` when this value is a dictionary.
	pub fn get(&self, key: &str) -> Option<&BValue> {
		self.as_dict().and_then(|map| map.get(key.as_bytes()))
	}

	pub fn kind(&self) -> &'static str {
		match self {
			BValue::ByteString(_) => "byte string",
			BValue::Integer(_) => "integer",
			BValue::List(_) => "list",
			BValue::Dict(_) => "dictionary",
		}
	}
}

impl From<&str> for BValue {
	fn from(value: &str) -> Self {
		BValue::ByteString(value.as_bytes().to_vec())
	}
}

impl From<Vec<u8>> for BValue {
	fn from(value: Vec<u8>) -> Self {
		BValue::ByteString(value)
	}
}

impl From<i64> for BValue {
	fn from(value: i64) -> Self {
		BValue::Integer(value)
	}
}
