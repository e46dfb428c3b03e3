use std::fmt;

use crate::vuart::{
	Level,
	Line,
};

#[derive(Debug, Fail)]
pub enum ReceiveError {
	/// line handle couldn't be configured or accessed; fatal
	#[fail(display = "hardware fault: {}", _0)]
	HardwareFault(String),

	/// a wait with a deadline didn't observe the target level in time
	#[fail(display = "timeout waiting for {} line to go {}", line, level)]
	Timeout {
		line: Line,
		level: Level,
	},

	/// message exceeded the configured length limit (and was drained up to its line feed)
	#[fail(display = "message longer than {} bytes", limit)]
	ProtocolViolation {
		limit: usize,
	},

	/// stop was requested while waiting for a line
	#[fail(display = "interrupted while waiting for {} line", _0)]
	Interrupted(Line),
}

impl ReceiveError {
	pub fn hardware_fault<E: fmt::Display>(what: fmt::Arguments, cause: E) -> failure::Error {
		ReceiveError::HardwareFault(format!("{}: {}", what, cause)).into()
	}
}

pub fn as_receive_error(e: &failure::Error) -> Option<&ReceiveError> {
	e.downcast_ref::<ReceiveError>()
}
