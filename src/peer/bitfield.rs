use crate::peer::error::PeerError;

/// Which pieces a peer holds, one bit per piece, most significant bit first.
///
/// Bits at index `piece_count` and above are always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitField {
	bits: Vec<u8>,
	piece_count: usize,
}

impl BitField {
	/// A bitfield with no pieces set.
	pub fn empty(piece_count: usize) -> Self {
		Self {
			bits: vec![0u8; piece_count.div_ceil(8)],
			piece_count,
		}
	}

	/// Takes the payload of a received `bitfield` message.
	///
	/// The payload must be exactly `ceil(piece_count / 8)` bytes and its
	/// spare trailing bits must be clear.
	pub fn from_payload(bits: Vec<u8>, piece_count: usize) -> Result<Self, PeerError> {
		let expected = piece_count.div_ceil(8);
		if bits.len() != expected {
			return Err(PeerError::InvalidBitfield(format!(
				"{} bytes for {} pieces, expected {}",
				bits.len(),
				piece_count,
				expected
			)));
		}

		let spare = expected * 8 - piece_count;
		if spare > 0 {
			let mask = (1u8 << spare) - 1;
			if bits[expected - 1] & mask != 0 {
				return Err(PeerError::InvalidBitfield("spare bits are set".to_string()));
			}
		}

		Ok(Self { bits, piece_count })
	}

	pub fn has_piece(&self, index: usize) -> bool {
		if index >= self.piece_count {
			return false;
		}
		self.bits[index / 8] & (1 << (7 - index % 8)) != 0
	}

	/// Marks `index` as held. Indices past the piece count are ignored.
	pub fn set_piece(&mut self, index: usize) {
		if index >= self.piece_count {
			return;
		}
		self.bits[index / 8] |= 1 << (7 - index % 8);
	}

	pub fn piece_count(&self) -> usize {
		self.piece_count
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.bits
	}

	/// Indices of the pieces held, ascending.
	pub fn pieces(&self) -> impl Iterator<Item = usize> + '_ {
		(0..self.piece_count).filter(|&i| self.has_piece(i))
	}

	pub fn count(&self) -> usize {
		self.bits.iter().map(|b| b.count_ones() as usize).sum()
	}

	pub fn is_complete(&self) -> bool {
		self.count() == self.piece_count
	}
}
