use std::collections::BTreeMap;

use super::error::BencodeError;
use super::scanner::Scanner;
use crate::bencode::bvalue::BValue;

/// Containers nested deeper than this are rejected rather than recursed into.
pub const MAX_NESTING: usize = 256;

/// Decodes every top-level token in `input`, in order.
///
/// Whitespace between top-level tokens is skipped, so a document followed by
/// trailing data yields more than one token. Callers interested in a single
/// document take the first element.
pub fn decode(input: &[u8]) -> Result<Vec<BValue>, BencodeError> {
	let mut decoder = Decoder::new(input);
	let mut tokens = Vec::new();

	loop {
		decoder.scanner.advance_whitespace();
		if decoder.scanner.ended() {
			break;
		}
		tokens.push(decoder.parse_token()?);
	}

	Ok(tokens)
}

/// Decodes the first token in `input` and reports how many bytes it spanned.
pub fn decode_bencode(input: &[u8]) -> Result<(usize, BValue), BencodeError> {
	let mut decoder = Decoder::new(input);
	let value = decoder.parse_token()?;
	Ok((decoder.scanner.position(), value))
}

struct Decoder<'a> {
	scanner: Scanner<'a>,
	depth: usize,
}

impl<'a> Decoder<'a> {
	fn new(input: &'a [u8]) -> Self {
		Self {
			scanner: Scanner::new(input),
			depth: 0,
		}
	}

	fn parse_token(&mut self) -> Result<BValue, BencodeError> {
		let position = self.scanner.position();

		match self.scanner.peek_byte()? {
			b'i' => self.parse_integer(),
			b'l' => self.nested(Self::parse_list),
			b'd' => self.nested(Self::parse_dict),
			c if c.is_ascii_digit() => self.parse_string().map(BValue::ByteString),
			c => Err(BencodeError::UnexpectedToken {
				position,
				found: c as char,
			}),
		}
	}

	fn nested(
		&mut self,
		parse: fn(&mut Self) -> Result<BValue, BencodeError>,
	) -> Result<BValue, BencodeError> {
		if self.depth >= MAX_NESTING {
			return Err(BencodeError::Unterminated {
				position: self.scanner.position(),
				kind: "container (nesting too deep)",
			});
		}
		self.depth += 1;
		let result = parse(self);
		self.depth -= 1;
		result
	}

	/// `<length>:<bytes>`
	fn parse_string(&mut self) -> Result<Vec<u8>, BencodeError> {
		let start = self.scanner.position();
		let (digits, found) = self.scanner.consume_until(b':');

		if !found {
			self.scanner.rewind(start);
			return Err(BencodeError::InvalidLength {
				position: start,
				reason: "expected ':' after length specification".to_string(),
			});
		}

		let length = parse_length(digits).ok_or_else(|| BencodeError::InvalidLength {
			position: start,
			reason: format!(
				"{:?} is not a non-negative base-10 length",
				String::from_utf8_lossy(digits)
			),
		})?;

		self.scanner.advance(1); // past the ':'

		let remaining = self.scanner.remaining();
		let data = self
			.scanner
			.consume(length)
			.map_err(|_| BencodeError::InvalidLength {
				position: start,
				reason: format!("declared {} bytes but only {} remain", length, remaining),
			})?;

		Ok(data.to_vec())
	}

	/// `i<digits>e`
	fn parse_integer(&mut self) -> Result<BValue, BencodeError> {
		let start = self.scanner.position();
		self.scanner.advance(1); // past the 'i'

		let (digits, found) = self.scanner.consume_until(b'e');
		if !found {
			return Err(BencodeError::Unterminated {
				position: start,
				kind: "integer",
			});
		}
		self.scanner.advance(1); // past the 'e'

		let invalid = |reason: String| BencodeError::InvalidInteger {
			position: start,
			reason,
		};

		let text = std::str::from_utf8(digits)
			.map_err(|_| invalid("non-ASCII data in integer".to_string()))?;
		validate_integer(text).map_err(invalid)?;

		// Bencode integers are unbounded; this implementation stops at 64 bits.
		let parsed = text
			.parse::<i64>()
			.map_err(|e| invalid(format!("{:?} does not fit in 64 bits: {}", text, e)))?;

		Ok(BValue::Integer(parsed))
	}

	/// `l<tokens>e`, with whitespace tolerated between elements.
	fn parse_list(&mut self) -> Result<BValue, BencodeError> {
		let start = self.scanner.position();
		self.scanner.advance(1); // past the 'l'

		let mut items = Vec::new();
		loop {
			self.scanner.advance_whitespace();
			match self.scanner.peek_byte() {
				Err(_) => {
					return Err(BencodeError::Unterminated {
						position: start,
						kind: "list",
					})
				}
				Ok(b'e') => {
					self.scanner.advance(1);
					break;
				}
				Ok(_) => items.push(self.parse_token()?),
			}
		}

		Ok(BValue::List(items))
	}

	/// `d<key><value>...e`. Key order is not enforced; a repeated key keeps
	/// the last value.
	fn parse_dict(&mut self) -> Result<BValue, BencodeError> {
		let start = self.scanner.position();
		self.scanner.advance(1); // past the 'd'

		let mut map = BTreeMap::new();
		loop {
			self.scanner.advance_whitespace();
			let key_position = self.scanner.position();
			match self.scanner.peek_byte() {
				Err(_) => {
					return Err(BencodeError::Unterminated {
						position: start,
						kind: "dictionary",
					})
				}
				Ok(b'e') => {
					self.scanner.advance(1);
					break;
				}
				Ok(c) if !c.is_ascii_digit() => {
					return Err(BencodeError::InvalidKey {
						position: key_position,
					})
				}
				Ok(_) => {}
			}

			let key = self.parse_string()?;
			self.scanner.advance_whitespace();
			let value = self.parse_token()?;
			map.insert(key, value);
		}

		Ok(BValue::Dict(map))
	}
}

fn parse_length(digits: &[u8]) -> Option<usize> {
	if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
		return None;
	}
	std::str::from_utf8(digits).ok()?.parse::<usize>().ok()
}

/// Rejects empty digit runs, `-0`, and leading zeros on anything but `0`.
fn validate_integer(text: &str) -> Result<(), String> {
	let negative = text.starts_with('-');
	let digits = if negative { &text[1..] } else { text };

	if digits.is_empty() {
		return Err(format!("no digits in {:?}", text));
	}
	if !digits.bytes().all(|b| b.is_ascii_digit()) {
		return Err(format!("{:?} is not a base-10 integer", text));
	}
	if digits.starts_with('0') {
		if negative {
			return Err(format!("negative zero is not allowed: {}", text));
		}
		if digits.len() > 1 {
			return Err(format!("Leading zeros are not allowed: {}", text));
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn bytes(s: &str) -> BValue {
		BValue::ByteString(s.as_bytes().to_vec())
	}

	fn first(input: &[u8]) -> Result<BValue, BencodeError> {
		decode_bencode(input).map(|(_, value)| value)
	}

	#[test]
	fn test_decode_integer() {
		let input = b"i42e";
		let (consumed, value) = decode_bencode(input).unwrap();
		assert_eq!(consumed, input.len());
		assert_eq!(value, BValue::Integer(42));
	}

	#[test]
	fn test_decode_negative_integer() {
		assert_eq!(first(b"i-3e").unwrap(), BValue::Integer(-3));
	}

	#[test]
	fn test_decode_integer_zero() {
		assert_eq!(first(b"i0e").unwrap(), BValue::Integer(0));
	}

	#[test]
	fn test_decode_integer_limits() {
		assert_eq!(
			first(b"i9223372036854775807e").unwrap(),
			BValue::Integer(i64::MAX)
		);
		assert!(matches!(
			first(b"i9223372036854775808e"),
			Err(BencodeError::InvalidInteger { position: 0, .. })
		));
	}

	#[test]
	fn test_decode_string() {
		let input = b"4:spam";
		let (consumed, value) = decode_bencode(input).unwrap();
		assert_eq!(consumed, input.len());
		assert_eq!(value, bytes("spam"));
	}

	#[test]
	fn test_decode_empty_string() {
		assert_eq!(first(b"0:").unwrap(), bytes(""));
	}

	#[test]
	fn test_decode_binary_string() {
		let input = b"3:\x00\xff\x13";
		assert_eq!(
			first(input).unwrap(),
			BValue::ByteString(vec![0x00, 0xff, 0x13])
		);
	}

	#[test]
	fn test_decode_list() {
		assert_eq!(
			first(b"l4:spam4:eggse").unwrap(),
			BValue::List(vec![bytes("spam"), bytes("eggs")])
		);
	}

	#[test]
	fn test_decode_nested_list() {
		let input = b"l4:spaml3:eggi3eee";
		let (consumed, value) = decode_bencode(input).unwrap();
		assert_eq!(consumed, input.len());
		assert_eq!(
			value,
			BValue::List(vec![
				bytes("spam"),
				BValue::List(vec![bytes("egg"), BValue::Integer(3)]),
			])
		);
	}

	#[test]
	fn test_decode_list_tolerates_whitespace() {
		assert_eq!(
			first(b"l 4:spam\n i1e e").unwrap(),
			BValue::List(vec![bytes("spam"), BValue::Integer(1)])
		);
	}

	#[test]
	fn test_decode_dict() {
		let value = first(b"d3:cow3:moo4:spam4:eggse").unwrap();
		let mut expected = BTreeMap::new();
		expected.insert(b"cow".to_vec(), bytes("moo"));
		expected.insert(b"spam".to_vec(), bytes("eggs"));
		assert_eq!(value, BValue::Dict(expected));
	}

	#[test]
	fn test_decode_dict_unsorted_keys_accepted() {
		let value = first(b"d4:spam4:eggs3:cow3:mooe").unwrap();
		assert_eq!(value.get("cow"), Some(&bytes("moo")));
		assert_eq!(value.get("spam"), Some(&bytes("eggs")));
	}

	#[test]
	fn test_decode_empty_dict() {
		assert_eq!(first(b"de").unwrap(), BValue::Dict(BTreeMap::new()));
	}

	#[test]
	fn test_decode_dict_with_nested_list() {
		let value = first(b"d4:spaml1:a1:bee").unwrap();
		assert_eq!(
			value.get("spam"),
			Some(&BValue::List(vec![bytes("a"), bytes("b")]))
		);
	}

	#[test]
	fn test_decode_multiple_top_level_tokens() {
		let tokens = decode(b"i1e 4:spam\nde").unwrap();
		assert_eq!(
			tokens,
			vec![
				BValue::Integer(1),
				bytes("spam"),
				BValue::Dict(BTreeMap::new())
			]
		);
	}

	#[test]
	fn test_decode_empty_input() {
		assert_eq!(decode(b"").unwrap(), Vec::new());
		assert!(matches!(
			first(b""),
			Err(BencodeError::EndOfInput { position: 0 })
		));
	}

	//
	// Malformed inputs
	//

	#[test]
	fn test_decode_leading_zeros() {
		assert!(matches!(
			first(b"i03e"),
			Err(BencodeError::InvalidInteger { .. })
		));
	}

	#[test]
	fn test_decode_negative_zero() {
		assert!(matches!(
			first(b"i-0e"),
			Err(BencodeError::InvalidInteger { .. })
		));
		assert!(first(b"i-03e").is_err());
	}

	#[test]
	fn test_decode_integer_empty_or_signed() {
		assert!(first(b"ie").is_err());
		assert!(first(b"i-e").is_err());
		assert!(first(b"i+5e").is_err());
		assert!(first(b"i1.5e").is_err());
	}

	#[test]
	fn test_decode_integer_missing_e() {
		assert!(matches!(
			first(b"i42"),
			Err(BencodeError::Unterminated { kind: "integer", .. })
		));
	}

	#[test]
	fn test_decode_string_missing_colon() {
		assert!(matches!(
			first(b"5hello"),
			Err(BencodeError::InvalidLength { position: 0, .. })
		));
	}

	#[test]
	fn test_decode_string_too_short() {
		assert!(matches!(
			first(b"4:ab"),
			Err(BencodeError::InvalidLength { .. })
		));
	}

	#[test]
	fn test_decode_list_unclosed() {
		assert!(matches!(
			first(b"l4:spam"),
			Err(BencodeError::Unterminated { kind: "list", .. })
		));
	}

	#[test]
	fn test_decode_dict_unclosed() {
		assert!(matches!(
			first(b"d3:foo4:spam"),
			Err(BencodeError::Unterminated { kind: "dictionary", .. })
		));
	}

	#[test]
	fn test_decode_dict_key_not_string() {
		assert!(matches!(
			first(b"di42e4:spame"),
			Err(BencodeError::InvalidKey { position: 1 })
		));
	}

	#[test]
	fn test_decode_unexpected_token() {
		let err = decode(b"i1e x").unwrap_err();
		assert_eq!(
			err,
			BencodeError::UnexpectedToken {
				position: 4,
				found: 'x'
			}
		);
		assert_eq!(err.position(), Some(4));
	}

	#[test]
	fn test_decode_rejects_runaway_nesting() {
		let input = vec![b'l'; MAX_NESTING + 1];
		assert!(first(&input).is_err());
	}
}
