//! In-process stand-in for the sending side, reacting to ENABLE like a real
//! sender would. Used by tests and the `--simulate` mode of the receiver.

use std::collections::VecDeque;
use std::time::{
	Duration,
	Instant,
};

use super::{
	Bias,
	Direction,
	Hardware,
	Line,
	LINE_FEED,
};
use crate::error::ReceiveError;

/// Bytes sent during one NOTIFY period.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Frame {
	bytes: Vec<u8>,
	notify_after: Duration,
	clock_after: Duration,
	stall_at_bit: Option<usize>,
	hold_clock_at_bit: Option<(usize, Duration)>,
}

impl Frame {
	/// raw bytes; no line feed is added
	pub fn new(bytes: Vec<u8>) -> Self {
		Frame {
			bytes,
			notify_after: Duration::from_secs(0),
			clock_after: Duration::from_secs(0),
			stall_at_bit: None,
			hold_clock_at_bit: None,
		}
	}

	/// `text` followed by a line feed
	pub fn line<B: AsRef<[u8]>>(text: B) -> Self {
		let mut bytes = text.as_ref().to_vec();
		bytes.push(LINE_FEED);
		Frame::new(bytes)
	}

	/// raise NOTIFY only after the frame was pending for `delay`
	pub fn notify_after(mut self, delay: Duration) -> Self {
		self.notify_after = delay;
		self
	}

	/// raise CLOCK only after ENABLE was high for `delay` (for every bit)
	pub fn clock_after(mut self, delay: Duration) -> Self {
		self.clock_after = delay;
		self
	}

	/// never raise CLOCK for bit number `bit` (counted over the whole frame)
	pub fn stall_at_bit(mut self, bit: usize) -> Self {
		self.stall_at_bit = Some(bit);
		self
	}

	/// keep CLOCK high for `hold` after ENABLE falls on bit number `bit`,
	/// then drop the rest of the frame
	pub fn hold_clock_at_bit(mut self, bit: usize, hold: Duration) -> Self {
		self.hold_clock_at_bit = Some((bit, hold));
		self
	}

	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	fn bit_count(&self) -> usize {
		self.bytes.len() * 8
	}

	// LSB first
	fn bit(&self, index: usize) -> bool {
		0 != self.bytes[index / 8] & (1 << (index % 8))
	}
}

#[derive(Debug)]
pub struct SimulatedSender {
	frames: VecDeque<Frame>,
	pending_since: Instant,
	bit: usize,
	enable: bool,
	enable_since: Instant,
	clock: bool,
	data: bool,
	clock_held_until: Option<Instant>,
	configured: [Option<Direction>; 4],
	enable_rises: usize,
	completed_frames: usize,
	abandoned_frames: usize,
}

impl SimulatedSender {
	pub fn new(frames: Vec<Frame>) -> Self {
		let now = Instant::now();
		SimulatedSender {
			frames: frames.into(),
			pending_since: now,
			bit: 0,
			enable: false,
			enable_since: now,
			clock: false,
			data: false,
			clock_held_until: None,
			configured: [None; 4],
			enable_rises: 0,
			completed_frames: 0,
			abandoned_frames: 0,
		}
	}

	pub fn push(&mut self, frame: Frame) {
		if self.frames.is_empty() {
			self.pending_since = Instant::now();
		}
		self.frames.push_back(frame);
	}

	pub fn configured(&self, line: Line) -> Option<Direction> {
		self.configured[line.index()]
	}

	/// level the receiver currently drives on ENABLE
	pub fn enable(&self) -> bool {
		self.enable
	}

	/// number of handshakes the receiver started
	pub fn enable_rises(&self) -> usize {
		self.enable_rises
	}

	pub fn completed_frames(&self) -> usize {
		self.completed_frames
	}

	/// frames dropped because the receiver released ENABLE without waiting for CLOCK
	pub fn abandoned_frames(&self) -> usize {
		self.abandoned_frames
	}

	pub fn is_idle(&self) -> bool {
		self.frames.is_empty()
	}

	fn notify(&self) -> bool {
		if self.clock_held_until.is_some() {
			return false;
		}
		match self.frames.front() {
			Some(frame) => self.pending_since.elapsed() >= frame.notify_after,
			None => false,
		}
	}

	fn update_clock(&mut self) {
		if !self.enable || self.clock || !self.notify() {
			return;
		}
		let frame = match self.frames.front() {
			Some(frame) => frame,
			None => return,
		};
		if Some(self.bit) == frame.stall_at_bit
			|| self.bit >= frame.bit_count()
			|| self.enable_since.elapsed() < frame.clock_after
		{
			return;
		}
		self.data = frame.bit(self.bit);
		self.clock = true;
	}

	fn release_held_clock(&mut self) {
		let until = match self.clock_held_until {
			Some(until) => until,
			None => return,
		};
		if Instant::now() < until {
			return;
		}
		self.clock_held_until = None;
		self.clock = false;
		self.data = false;
		self.abandoned_frames += 1;
		self.next_frame();
	}

	fn next_frame(&mut self) {
		self.frames.pop_front();
		self.bit = 0;
		self.pending_since = Instant::now();
	}

	fn held_clock(&self) -> Option<Duration> {
		match self.frames.front()?.hold_clock_at_bit {
			Some((bit, hold)) if bit == self.bit => Some(hold),
			_ => None,
		}
	}

	fn enable_falling(&mut self) {
		if self.clock_held_until.is_some() {
			return;
		}
		if self.clock {
			if let Some(hold) = self.held_clock() {
				self.clock_held_until = Some(Instant::now() + hold);
				return;
			}
			self.clock = false;
			self.data = false;
			self.bit += 1;
			let done = match self.frames.front() {
				Some(frame) => self.bit >= frame.bit_count(),
				None => false,
			};
			if done {
				self.completed_frames += 1;
				self.next_frame();
			}
		} else if self.notify() {
			// receiver gave up on this bit; so does the sender
			self.abandoned_frames += 1;
			self.next_frame();
		}
	}
}

impl Hardware for SimulatedSender {
	fn configure(&mut self, line: Line, direction: Direction, _bias: Bias) -> crate::AResult<()> {
		if direction != line.direction() {
			return Err(ReceiveError::hardware_fault(
				format_args!("can't configure {} line as {:?}", line, direction),
				"simulated sender drives it the other way",
			));
		}
		self.configured[line.index()] = Some(direction);
		Ok(())
	}

	fn read_line(&mut self, line: Line) -> crate::AResult<bool> {
		self.release_held_clock();
		Ok(match line {
			Line::Notify => self.notify(),
			Line::Enable => self.enable,
			Line::Data => self.data,
			Line::Clock => {
				self.update_clock();
				self.clock
			},
		})
	}

	fn write_line(&mut self, line: Line, high: bool) -> crate::AResult<()> {
		if Line::Enable != line {
			return Err(ReceiveError::hardware_fault(
				format_args!("can't drive {} line", line),
				"input line",
			));
		}
		if high && !self.enable {
			self.enable = true;
			self.enable_since = Instant::now();
			self.enable_rises += 1;
		} else if !high && self.enable {
			self.enable = false;
			self.enable_falling();
		}
		Ok(())
	}
}
