use super::error::BencodeError;

/// A cursor over an immutable byte sequence.
///
/// The decoder drives it with single-byte lookahead. Nothing here allocates;
/// every slice handed out borrows from the underlying contents.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
	contents: &'a [u8],
	index: usize,
}

impl<'a> Scanner<'a> {
	pub fn new(contents: &'a [u8]) -> Self {
		Self { contents, index: 0 }
	}

	/// Current cursor position, counted in bytes from the start.
	pub fn position(&self) -> usize {
		self.index
	}

	/// Moves the cursor back (or forward) to a position obtained from `position`.
	pub fn rewind(&mut self, position: usize) {
		self.index = position.min(self.contents.len());
	}

	pub fn ended(&self) -> bool {
		self.index >= self.contents.len()
	}

	pub fn remaining(&self) -> usize {
		self.contents.len().saturating_sub(self.index)
	}

	/// Returns the next `n` bytes without moving the cursor.
	pub fn peek(&self, n: usize) -> Result<&'a [u8], BencodeError> {
		if self.remaining() < n {
			return Err(BencodeError::EndOfInput { position: self.index });
		}
		Ok(&self.contents[self.index..self.index + n])
	}

	/// Single-byte lookahead.
	pub fn peek_byte(&self) -> Result<u8, BencodeError> {
		self.peek(1).map(|bytes| bytes[0])
	}

	/// Like `peek`, but moves the cursor past the returned bytes.
	pub fn consume(&mut self, n: usize) -> Result<&'a [u8], BencodeError> {
		let consumed = self.peek(n)?;
		self.index += n;
		Ok(consumed)
	}

	/// Skips `n` bytes, clamped to the end of input. Returns whether the cursor moved.
	pub fn advance(&mut self, n: usize) -> bool {
		if self.ended() {
			return false;
		}
		self.index = (self.index + n).min(self.contents.len());
		true
	}

	/// Skips a run of whitespace. Never fails.
	pub fn advance_whitespace(&mut self) {
		while let Ok(byte) = self.peek_byte() {
			if !is_whitespace(byte) {
				break;
			}
			self.index += 1;
		}
	}

	/// Consumes bytes up to (not including) `delimiter`.
	///
	/// Returns the consumed bytes and whether the delimiter was found. When it
	/// is not found the remainder of the input has been consumed; callers that
	/// need to backtrack must `rewind` themselves.
	pub fn consume_until(&mut self, delimiter: u8) -> (&'a [u8], bool) {
		let start = self.index;
		let rest = &self.contents[start.min(self.contents.len())..];

		match rest.iter().position(|&b| b == delimiter) {
			Some(offset) => {
				self.index = start + offset;
				(&rest[..offset], true)
			}
			None => {
				self.index = self.contents.len();
				(rest, false)
			}
		}
	}
}

/// Space, tab, line feed, vertical tab, form feed, carriage return, NEL and NBSP.
fn is_whitespace(byte: u8) -> bool {
	matches!(byte, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r' | 0x85 | 0xA0)
}
