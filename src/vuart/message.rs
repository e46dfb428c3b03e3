use std::fmt;

pub const LINE_FEED: u8 = b'\n';

/// A decoded message, without its terminating line feed.
///
/// The bytes are kept as received; the `Display` implementation maps every
/// byte to the code point of the same value (Latin-1), it never decodes
/// UTF-8.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Message(Vec<u8>);

impl Message {
	pub(super) fn from_bytes(bytes: Vec<u8>) -> Self {
		debug_assert!(!bytes.contains(&LINE_FEED));
		Message(bytes)
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn to_latin1(&self) -> String {
		self.0.iter().map(|&b| b as char).collect()
	}

	pub fn to_hex(&self) -> String {
		let mut result = String::with_capacity(self.0.len() * 3);
		for (i, b) in self.0.iter().enumerate() {
			if i > 0 {
				result.push(' ');
			}
			result.push_str(&format!("{:02x}", b));
		}
		result
	}
}

impl fmt::Display for Message {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for &b in &self.0 {
			fmt::Write::write_char(f, b as char)?;
		}
		Ok(())
	}
}

impl fmt::Debug for Message {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "Message({:?})", self.to_latin1())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn latin1_not_utf8() {
		// 0xc3 0xa9 is "é" in UTF-8, but two characters here
		let m = Message::from_bytes(vec![b'a', 0xc3, 0xa9]);
		assert_eq!(m.to_latin1(), "a\u{c3}\u{a9}");
		assert_eq!(m.to_string(), m.to_latin1());
		assert_eq!(m.to_latin1().chars().count(), 3);
		assert_eq!(m.to_hex(), "61 c3 a9");
	}

	#[test]
	fn empty() {
		let m = Message::default();
		assert!(m.is_empty());
		assert_eq!(m.to_string(), "");
		assert_eq!(m.to_hex(), "");
	}
}
