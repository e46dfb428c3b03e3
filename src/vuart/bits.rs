/// 8 samples of the DATA line, least significant bit first
pub type BitSequence = [bool; 8];

pub fn assemble(bits: &BitSequence) -> u8 {
	let mut byte = 0u8;
	for (i, &bit) in bits.iter().enumerate() {
		byte |= (bit as u8) << i;
	}
	byte
}

pub fn bits_of(byte: u8) -> BitSequence {
	let mut bits = [false; 8];
	for (i, bit) in bits.iter_mut().enumerate() {
		*bit = 0 != byte & (1 << i);
	}
	bits
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lsb_first() {
		// 'h' = 0x68 = 0b0110_1000
		let bits = [false, false, false, true, false, true, true, false];
		assert_eq!(assemble(&bits), b'h');
		assert_eq!(bits_of(b'h'), bits);

		assert_eq!(assemble(&[true, false, false, false, false, false, false, false]), 0x01);
		assert_eq!(assemble(&[false, false, false, false, false, false, false, true]), 0x80);
	}

	#[test]
	fn assemble_inverts_decomposition() {
		for byte in 0..=255u8 {
			assert_eq!(assemble(&bits_of(byte)), byte);
		}
	}
}
