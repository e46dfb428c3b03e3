use std::sync::atomic::{
	AtomicBool,
	Ordering,
};
use std::time::{
	Duration,
	Instant,
};

use super::{
	BitSequence,
	Hardware,
	Level,
	Line,
	assemble,
	reliable_sleep,
};
use crate::error::ReceiveError;

/// How a single wait for a line level behaves.
///
/// The default spins without pause and never gives up.
#[derive(Clone, Copy, Debug, Default)]
pub struct WaitPolicy {
	/// pause between two polls; `None` busy-waits
	pub poll_interval: Option<Duration>,
	/// maximum duration of a single wait
	pub timeout: Option<Duration>,
	/// checked on every poll; wait fails with `Interrupted` once set
	pub stop: Option<&'static AtomicBool>,
}

impl WaitPolicy {
	fn stop_requested(&self) -> bool {
		match self.stop {
			Some(stop) => stop.load(Ordering::SeqCst),
			None => false,
		}
	}
}

/// States of the per-bit handshake, in order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum BitPhase {
	AssertEnable,
	WaitClockHigh,
	Sample,
	DeassertEnable,
	WaitClockLow,
}

trait InternalLowLevel: Hardware {
	// ENABLE must not stay asserted when a bit is abandoned; the sender
	// sees the falling edge without a clock pulse and gives up too.
	fn _abandon_handshake(&mut self, phase: BitPhase, e: failure::Error) -> failure::Error {
		debug!("abandoning bit handshake in phase {:?}: {}", phase, e);
		if let Err(release) = self.write_line(Line::Enable, false) {
			warn!("couldn't release {} line: {}", Line::Enable, release);
		}
		e
	}
}

impl<H: Hardware + ?Sized> InternalLowLevel for H {
}

pub trait LowLevel: Hardware {
	/// Poll `line` until it reads `target`.
	fn wait_for(&mut self, line: Line, target: bool, policy: &WaitPolicy) -> crate::AResult<()> {
		// a deadline beyond what `Instant` can represent is no deadline at all
		let deadline = policy.timeout.and_then(|timeout| Instant::now().checked_add(timeout));
		loop {
			if target == self.read_line(line)? {
				return Ok(());
			}
			if policy.stop_requested() {
				return Err(ReceiveError::Interrupted(line).into());
			}
			if let Some(deadline) = deadline {
				if Instant::now() >= deadline {
					return Err(ReceiveError::Timeout {
						line,
						level: Level::from(target),
					}.into());
				}
			}
			if let Some(interval) = policy.poll_interval {
				reliable_sleep(interval);
			}
		}
	}

	/// One full ENABLE/CLOCK handshake; returns the DATA sample.
	fn sample_bit(&mut self, policy: &WaitPolicy) -> crate::AResult<bool> {
		let mut phase = BitPhase::AssertEnable;
		let mut bit = false;
		loop {
			phase = match phase {
				BitPhase::AssertEnable => {
					self.write_line(Line::Enable, true)?;
					BitPhase::WaitClockHigh
				},
				BitPhase::WaitClockHigh => {
					if let Err(e) = self.wait_for(Line::Clock, true, policy) {
						return Err(self._abandon_handshake(phase, e));
					}
					BitPhase::Sample
				},
				BitPhase::Sample => {
					bit = match self.read_line(Line::Data) {
						Ok(bit) => bit,
						Err(e) => return Err(self._abandon_handshake(phase, e)),
					};
					BitPhase::DeassertEnable
				},
				BitPhase::DeassertEnable => {
					self.write_line(Line::Enable, false)?;
					BitPhase::WaitClockLow
				},
				BitPhase::WaitClockLow => {
					self.wait_for(Line::Clock, false, policy)?;
					return Ok(bit);
				},
			};
		}
	}

	/// 8 handshakes, least significant bit first
	fn receive_byte(&mut self, policy: &WaitPolicy) -> crate::AResult<u8> {
		let mut bits: BitSequence = [false; 8];
		for bit in bits.iter_mut() {
			*bit = self.sample_bit(policy)?;
		}
		let byte = assemble(&bits);
		trace!("received byte 0x{:02x}", byte);
		Ok(byte)
	}
}

impl<H: Hardware + ?Sized> LowLevel for H {
}
