use std::sync::atomic::AtomicBool;
use std::time::Duration;

use super::{
	Hardware,
	LINE_FEED,
	Line,
	LowLevel,
	Message,
	WaitPolicy,
};
use crate::error::ReceiveError;

#[derive(Clone, Copy, Debug, Default)]
pub struct ReceiverConfig {
	/// pause between two polls of a line; `None` busy-waits
	pub poll_interval: Option<Duration>,
	/// maximum wait for NOTIFY before a message
	pub notify_timeout: Option<Duration>,
	/// maximum wait for each CLOCK edge
	pub bit_timeout: Option<Duration>,
	/// longer messages are drained and reported as `ProtocolViolation`
	pub max_message_len: Option<usize>,
	pub stop: Option<&'static AtomicBool>,
}

impl ReceiverConfig {
	pub fn notify_policy(&self) -> WaitPolicy {
		WaitPolicy {
			poll_interval: self.poll_interval,
			timeout: self.notify_timeout,
			stop: self.stop,
		}
	}

	pub fn bit_policy(&self) -> WaitPolicy {
		WaitPolicy {
			poll_interval: self.poll_interval,
			timeout: self.bit_timeout,
			stop: self.stop,
		}
	}
}

/// Owns the four lines; ENABLE is driven low again when dropped.
pub struct Receiver<H: Hardware> {
	hardware: H,
	config: ReceiverConfig,
}

impl<H: Hardware> Receiver<H> {
	/// Configures all four lines and leaves ENABLE low.
	pub fn new(mut hardware: H, config: ReceiverConfig) -> crate::AResult<Self> {
		for &line in &Line::ALL {
			hardware.configure(line, line.direction(), line.bias())?;
		}
		hardware.write_line(Line::Enable, false)?;

		Ok(Receiver {
			hardware,
			config,
		})
	}

	pub fn hardware(&mut self) -> &mut H {
		&mut self.hardware
	}

	/// Wait for NOTIFY, then decode bytes up to (not including) the next
	/// line feed.
	///
	/// After an error the in-flight message is gone; the next call starts
	/// by waiting for NOTIFY again.
	pub fn read_message(&mut self) -> crate::AResult<Message> {
		self.hardware.wait_for(Line::Notify, true, &self.config.notify_policy())?;
		debug!("sender raised {} line", Line::Notify);

		let policy = self.config.bit_policy();
		let mut bytes = Vec::new();
		loop {
			let byte = self.hardware.receive_byte(&policy)?;
			if LINE_FEED == byte {
				break;
			}
			if let Some(limit) = self.config.max_message_len {
				if bytes.len() >= limit {
					self.drain_message(&policy)?;
					return Err(ReceiveError::ProtocolViolation { limit }.into());
				}
			}
			bytes.push(byte);
		}

		Ok(Message::from_bytes(bytes))
	}

	// keep clocking bytes out of the sender until the line feed so the next
	// message starts in sync
	fn drain_message(&mut self, policy: &WaitPolicy) -> crate::AResult<()> {
		let mut dropped = 1usize;
		while LINE_FEED != self.hardware.receive_byte(policy)? {
			dropped += 1;
		}
		debug!("drained {} bytes of over-long message", dropped);
		Ok(())
	}
}

impl<H: Hardware> Drop for Receiver<H> {
	fn drop(&mut self) {
		if let Err(e) = self.hardware.write_line(Line::Enable, false) {
			warn!("couldn't release {} line: {}", Line::Enable, e);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Instant;

	use super::*;
	use crate::error::as_receive_error;
	use crate::vuart::simulated::{
		Frame,
		SimulatedSender,
	};
	use crate::vuart::{
		Direction,
		Level,
	};

	fn receiver(frames: Vec<Frame>, config: ReceiverConfig) -> Receiver<SimulatedSender> {
		Receiver::new(SimulatedSender::new(frames), config).unwrap()
	}

	fn receive_error(e: &failure::Error) -> &ReceiveError {
		as_receive_error(e).unwrap_or_else(|| panic!("not a ReceiveError: {}", e))
	}

	#[test]
	fn configures_all_lines() {
		let mut rx = receiver(vec![], ReceiverConfig::default());
		let sender = rx.hardware();
		assert_eq!(sender.configured(Line::Enable), Some(Direction::Output));
		assert_eq!(sender.configured(Line::Notify), Some(Direction::Input));
		assert_eq!(sender.configured(Line::Data), Some(Direction::Input));
		assert_eq!(sender.configured(Line::Clock), Some(Direction::Input));
		assert!(!sender.enable());
	}

	#[test]
	fn decodes_hi() {
		let mut rx = receiver(vec![Frame::new(vec![0x68, 0x69, 0x0a])], ReceiverConfig::default());
		let message = rx.read_message().unwrap();
		assert_eq!(message.as_bytes(), b"hi");
		assert_eq!(message.to_string(), "hi");
		assert_eq!(rx.hardware().enable_rises(), 3 * 8);
	}

	#[test]
	fn line_feed_first_is_empty_message() {
		let mut rx = receiver(vec![Frame::new(vec![0x0a, b'x', 0x0a])], ReceiverConfig::default());
		assert!(rx.read_message().unwrap().is_empty());
		// the rest of the frame is still pending; NOTIFY stays high
		assert_eq!(rx.read_message().unwrap().as_bytes(), b"x");
	}

	#[test]
	fn line_feed_never_included() {
		let mut rx = receiver(vec![Frame::line("a\nb")], ReceiverConfig::default());
		assert_eq!(rx.read_message().unwrap().as_bytes(), b"a");
		assert_eq!(rx.read_message().unwrap().as_bytes(), b"b");
	}

	#[test]
	fn same_transitions_same_message() {
		let frames = || vec![Frame::line(&[0x00, 0xff, 0x80, b'z'][..])];
		let first = receiver(frames(), ReceiverConfig::default()).read_message().unwrap();
		let second = receiver(frames(), ReceiverConfig::default()).read_message().unwrap();
		assert_eq!(first, second);
		assert_eq!(first.as_bytes(), &[0x00, 0xff, 0x80, b'z']);
	}

	#[test]
	fn notify_deadline_shorter_than_sender_delay() {
		let frames = || vec![Frame::line("hi").notify_after(Duration::from_millis(100))];

		let mut rx = receiver(frames(), ReceiverConfig {
			notify_timeout: Some(Duration::from_millis(10)),
			..ReceiverConfig::default()
		});
		match receive_error(&rx.read_message().unwrap_err()) {
			ReceiveError::Timeout { line: Line::Notify, level: Level::High } => (),
			other => panic!("unexpected: {:?}", other),
		}

		// without deadline the same input blocks until NOTIFY arrives
		let started = Instant::now();
		let mut rx = receiver(frames(), ReceiverConfig::default());
		assert_eq!(rx.read_message().unwrap().as_bytes(), b"hi");
		assert!(started.elapsed() >= Duration::from_millis(100));
	}

	#[test]
	fn bit_deadline_shorter_than_sender_delay() {
		let frames = || vec![Frame::line("").clock_after(Duration::from_millis(50))];

		let mut rx = receiver(frames(), ReceiverConfig {
			bit_timeout: Some(Duration::from_millis(5)),
			..ReceiverConfig::default()
		});
		match receive_error(&rx.read_message().unwrap_err()) {
			ReceiveError::Timeout { line: Line::Clock, level: Level::High } => (),
			other => panic!("unexpected: {:?}", other),
		}
		assert!(!rx.hardware().enable());

		let mut rx = receiver(frames(), ReceiverConfig::default());
		assert!(rx.read_message().unwrap().is_empty());
	}

	#[test]
	fn timeout_does_not_spoil_next_message() {
		let mut rx = receiver(vec![
			Frame::line("broken").stall_at_bit(13),
			Frame::line("fine"),
		], ReceiverConfig {
			bit_timeout: Some(Duration::from_millis(5)),
			..ReceiverConfig::default()
		});

		match receive_error(&rx.read_message().unwrap_err()) {
			ReceiveError::Timeout { line: Line::Clock, .. } => (),
			other => panic!("unexpected: {:?}", other),
		}
		assert!(!rx.hardware().enable());
		assert_eq!(rx.read_message().unwrap().as_bytes(), b"fine");
	}

	#[test]
	fn clock_stuck_high_times_out_then_recovers() {
		let mut rx = receiver(vec![
			Frame::line("stuck").hold_clock_at_bit(3, Duration::from_millis(30)),
			Frame::line("ok"),
		], ReceiverConfig {
			bit_timeout: Some(Duration::from_millis(5)),
			..ReceiverConfig::default()
		});

		match receive_error(&rx.read_message().unwrap_err()) {
			ReceiveError::Timeout { line: Line::Clock, level: Level::Low } => (),
			other => panic!("unexpected: {:?}", other),
		}
		assert!(!rx.hardware().enable());
		assert_eq!(rx.read_message().unwrap().as_bytes(), b"ok");
		assert_eq!(rx.hardware().abandoned_frames(), 1);
	}

	#[test]
	fn over_long_message_is_drained() {
		let mut rx = receiver(vec![
			Frame::line("too long"),
			Frame::line("ok"),
		], ReceiverConfig {
			max_message_len: Some(3),
			..ReceiverConfig::default()
		});

		match receive_error(&rx.read_message().unwrap_err()) {
			ReceiveError::ProtocolViolation { limit: 3 } => (),
			other => panic!("unexpected: {:?}", other),
		}
		assert_eq!(rx.read_message().unwrap().as_bytes(), b"ok");
	}

	#[test]
	fn message_at_limit_is_fine() {
		let mut rx = receiver(vec![Frame::line("abc")], ReceiverConfig {
			max_message_len: Some(3),
			..ReceiverConfig::default()
		});
		assert_eq!(rx.read_message().unwrap().as_bytes(), b"abc");
	}

	#[test]
	fn stop_flag_interrupts_notify_wait() {
		static STOP: AtomicBool = AtomicBool::new(true);
		let mut rx = receiver(vec![], ReceiverConfig {
			stop: Some(&STOP),
			..ReceiverConfig::default()
		});
		match receive_error(&rx.read_message().unwrap_err()) {
			ReceiveError::Interrupted(Line::Notify) => (),
			other => panic!("unexpected: {:?}", other),
		}
	}

	#[test]
	fn enable_released_on_drop() {
		let mut sender = SimulatedSender::new(vec![]);
		{
			let mut rx = Receiver::new(&mut sender, ReceiverConfig::default()).unwrap();
			rx.hardware().write_line(Line::Enable, true).unwrap();
		}
		assert!(!sender.enable());
	}
}
