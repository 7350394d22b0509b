/// Percent-encodes arbitrary bytes for use in a query string.
///
/// `info_hash` and `peer_id` are raw 20-byte values, not text, so they cannot
/// go through a `&str`-based encoder. Produces uppercase hex ("%3A" not "%3a").
pub fn url_encode_bytes(bytes: &[u8]) -> String {
	let mut encoded = String::with_capacity(bytes.len() * 3);
	for &b in bytes {
		if is_unreserved(b) {
			encoded.push(b as char);
		} else {
			encoded.push_str(&format!("%{:02X}", b));
		}
	}
	encoded
}

/// RFC 3986 unreserved set: ALPHA / DIGIT / "-" / "." / "_" / "~"
fn is_unreserved(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'_' | b'~')
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_encode_percent() {
		assert_eq!(url_encode_bytes(&[0x12, 0x34, 0x56]), "%12%34%56");
	}

	#[test]
	fn test_unreserved_kept() {
		assert_eq!(url_encode_bytes(b"aZ09-._~"), "aZ09-._~");
		assert_eq!(url_encode_bytes(b"a b&c"), "a%20b%26c");
		assert_eq!(url_encode_bytes(&[0xff, 0x00]), "%FF%00");
	}
}
